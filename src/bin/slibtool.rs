//! `slibtool`: a native build-time librarian (see `slibtool::archive` for
//! the archiver engine and `slibtool::link` for the link orchestrator this
//! binary drives).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use slibtool::driver::argv::{
    check_incompatible_pairs, expand_objectlists, normalize_argv, program_basename, split_targv_cargv, SplitArgv,
};
use slibtool::driver::context::{DriverContext, ExecContext, Mode};
use slibtool::host::triplet::{build_machine_triplet, derive_host};
use slibtool::host::tools;
use slibtool::link::{deps, filenames, implib, wrapper};
use slibtool::modes::{ar_mode, config, execute, install, uninstall};
use slibtool::{plan, ArchiveKind, ErrorKind, LinkRequest, OutputPolicy, SlbtError};

/// A fast native replacement for the GNU libtool script.
#[derive(Parser, Debug)]
#[command(name = "slibtool", version, about, disable_help_subcommand = true)]
struct Cli {
    /// Operating mode: compile, link, install, uninstall, execute, ar, config, info.
    #[arg(long = "mode", value_name = "MODE")]
    mode: Option<String>,

    #[arg(long = "host", value_name = "TRIPLET")]
    host: Option<String>,

    #[arg(long = "target", value_name = "TRIPLET")]
    target: Option<String>,

    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long = "no-color")]
    no_color: bool,

    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Everything after the recognized global flags: mode-specific
    /// arguments and, for link mode, the downstream compiler invocation.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

fn mode_from_str(s: &str) -> Mode {
    match s {
        "compile" => Mode::Compile,
        "link" => Mode::Link,
        "install" => Mode::Install,
        "uninstall" => Mode::Uninstall,
        "execute" => Mode::Execute,
        "ar" => Mode::Ar,
        "config" => Mode::Config,
        "info" => Mode::Info,
        "stoolie" => Mode::Stoolie,
        _ => Mode::Link,
    }
}

fn resolve_mode(explicit: Option<&str>, argv0: &str) -> Mode {
    if let Some(m) = explicit {
        return mode_from_str(m);
    }
    match program_basename(argv0) {
        "ar" | "slibtool-ar" => Mode::Ar,
        "slibtool-install" | "libtool-install" => Mode::Install,
        "slibtool-uninstall" | "libtool-uninstall" => Mode::Uninstall,
        "slibtool-execute" => Mode::Execute,
        "slibtool-config" => Mode::Config,
        "slibtool-info" => Mode::Info,
        _ => Mode::Link,
    }
}

fn extract_libname(output: &str) -> Option<String> {
    let base = program_basename(output);
    let stem = base.strip_suffix(".la")?;
    Some(stem.strip_prefix("lib").unwrap_or(stem).to_string())
}

fn run_ar(ctx: &DriverContext, split: &SplitArgv) -> Result<(), SlbtError> {
    use ar_mode::{ArModeRequest, PrettyKind, PrintKind};

    let mut req = ArModeRequest::default();
    let args = &split.dargv;
    let mut i = 0;
    while i < args.len() {
        let tok = args[i].as_str();
        match tok {
            "-Wcheck" => req.check = true,
            "-Wmerge" => req.merge = true,
            "-Wmapfile" => req.mapfile = true,
            "-Wposix" => req.pretty = Some(PrettyKind::Posix),
            "-Wyaml" => req.pretty = Some(PrettyKind::Yaml),
            "-Wverbose" => req.verbose = true,
            "-Wprint" | "-Wprint=members" => req.print = Some(PrintKind::Members),
            "-Wprint=symbols" => req.print = Some(PrintKind::Symbols),
            "-Wregex" => {
                i += 1;
                req.regex = args.get(i).cloned();
            }
            "-Woutput" => {
                i += 1;
                req.output = args.get(i).map(PathBuf::from);
            }
            _ if tok.starts_with("-Woutput=") => req.output = Some(PathBuf::from(&tok[9..])),
            _ if tok.starts_with("-Wregex=") => req.regex = Some(tok[8..].to_string()),
            "-Wpretty=posix" => req.pretty = Some(PrettyKind::Posix),
            "-Wpretty=yaml" => req.pretty = Some(PrettyKind::Yaml),
            "-Wpretty=hexdata" => req.pretty = Some(PrettyKind::HexData),
            _ if !tok.starts_with('-') => req.inputs.push(PathBuf::from(tok)),
            _ => {}
        }
        i += 1;
    }

    let report = ar_mode::run(&req, ctx.flavor, ArchiveKind::Gnu)?;
    ar_mode::write_outputs(&req, &report)?;

    for line in report.member_lines.iter().chain(report.symbol_lines.iter()) {
        println!("{line}");
    }
    if req.output.is_none() {
        if let Some(body) = &report.mapfile_body {
            print!("{body}");
        }
    }
    Ok(())
}

fn run_link(ctx: &DriverContext, split: &SplitArgv) -> Result<(), SlbtError> {
    check_incompatible_pairs(&split.targv)?;

    let mut req = LinkRequest::default();
    let mut output: Option<String> = None;
    let mut lib_dirs: Vec<PathBuf> = Vec::new();
    let mut libs: Vec<String> = Vec::new();
    let mut dep_archives: Vec<PathBuf> = Vec::new();
    let targv = &split.targv;
    let mut i = 0;
    while i < targv.len() {
        let tok = targv[i].as_str();
        match tok {
            "-o" => {
                i += 1;
                output = targv.get(i).cloned();
            }
            "-static" => req.static_requested = true,
            "-shared" => req.shared_requested = true,
            "-module" => req.module = true,
            "-avoid-version" => req.avoid_version = true,
            "-static-libtool-libs" => req.static_libtool_libs = true,
            "-rpath" => {
                i += 1;
                req.rpath = targv.get(i).cloned();
            }
            "-release" => {
                i += 1;
                req.release = targv.get(i).cloned();
            }
            "-version-info" => {
                i += 1;
                req.version = targv.get(i).cloned();
            }
            _ if tok.starts_with("-L") && tok.len() > 2 => lib_dirs.push(PathBuf::from(&tok[2..])),
            _ if tok.starts_with("-l") && tok.len() > 2 => libs.push(tok[2..].to_string()),
            _ if tok.ends_with(".la") => dep_archives.push(PathBuf::from(tok)),
            _ => {}
        }
        i += 1;
    }

    req.libname = output.as_deref().and_then(extract_libname);

    let mut cargv = expand_objectlists(&split.cargv, &ctx.cwd)?;
    let planned = plan(&req, ctx.flavor, &ctx.flavor_settings)?;

    if let (Some(libname), Some(version_spec)) = (&req.libname, &req.version) {
        if let Some(version) = filenames::VersionInfo::parse(version_spec) {
            if matches!(
                planned.policy,
                OutputPolicy::ArchiveSharedAndWrapper | OutputPolicy::ArchiveAndConvenienceDso
            ) {
                cargv.push(filenames::soname_linker_flag(libname, &ctx.flavor_settings, ctx.flavor, version));
            }
        }
    }

    tracing::info!(policy = ?planned.policy, compiler_argv = ?cargv, "planned link invocation");

    let mut exec = ExecContext {
        output: output.as_deref().map(PathBuf::from),
        rpath: req.rpath.as_deref().map(PathBuf::from),
        ..ExecContext::default()
    };

    // Phase 4 (dependency sidecar) and the `.la` text wrapper are pure-Rust
    // output of this process, so this driver writes them itself. Phase 5
    // (the PE import library) is logged but not spawned, since it needs a
    // `.def` file this dry plan never writes; the compiler/`ar` invocation
    // that actually produces the object/DSO bytes these files describe
    // stops here too, for the same reason, rather than being faked.
    if let Some(filenames) = &planned.filenames {
        if matches!(
            planned.policy,
            OutputPolicy::ArchiveSharedAndWrapper | OutputPolicy::ArchiveAndConvenienceDso
        ) {
            let mut entries: Vec<deps::DepEntry> = lib_dirs.iter().cloned().map(deps::DepEntry::LibDir).collect();
            entries.extend(libs.iter().cloned().map(deps::DepEntry::Lib));
            entries.extend(dep_archives.iter().cloned().map(deps::DepEntry::Archive));

            let libs_dir = ctx.cwd.join(".libs");
            let compacted = deps::compact(deps::normalize(entries, &libs_dir));
            let sidecar_body = deps::render_sidecar(&compacted);
            let sidecar_path = ctx.cwd.join(&filenames.rpath_sidecar);

            let has_dso = matches!(planned.policy, OutputPolicy::ArchiveSharedAndWrapper);
            let la_body = filenames::render_la(filenames, has_dso);
            let la_path = ctx.cwd.join(&filenames.lafilename);

            exec.scratch.push(sidecar_path.clone());
            exec.scratch.push(la_path.clone());

            if !ctx.dry_run {
                std::fs::write(&sidecar_path, sidecar_body)
                    .map_err(|e| SlbtError::system("bin::slibtool::run_link", e))?;
                std::fs::write(&la_path, la_body)
                    .map_err(|e| SlbtError::system("bin::slibtool::run_link", e))?;
            }

            if ctx.flavor.is_coff() {
                let build_machine = build_machine_triplet();
                let dlltool_tool =
                    tools::resolve_tool(tools::Tool::Dlltool, None, &ctx.host.host, &build_machine, ctx.flavor);
                let mdso_tool =
                    tools::resolve_tool(tools::Tool::Mdso, None, &ctx.host.host, &build_machine, ctx.flavor);
                if let (Some(dlltool_tool), Some(mdso_tool)) = (dlltool_tool, mdso_tool) {
                    let soname = filenames.soname_symlink.as_deref().unwrap_or(&filenames.dsofilename);
                    let implib_req = implib::ImplibRequest {
                        chooser: implib::ImplibChooser::Auto,
                        flavor: ctx.flavor,
                        mdso_tool: Path::new(&mdso_tool),
                        dlltool_tool: Path::new(&dlltool_tool),
                        assembler: None,
                        host_triplet: &ctx.host.host,
                        impfilename: Path::new(&filenames.implib_default),
                        deffilename: Path::new(&filenames.deffilename),
                        soname,
                    };
                    let implib_command = implib::build_command(&implib_req);
                    tracing::info!(implib_command = ?implib_command, "planned PE import-library invocation");
                    exec.scratch.push(ctx.cwd.join(&filenames.implib_default));
                }
            }
        }
    } else if matches!(planned.policy, OutputPolicy::Executable) {
        if let Some(output_name) = &output {
            let wrapper_path = ctx.cwd.join(output_name);
            let fixup = wrapper::dl_path_fixup(&ctx.cwd, &wrapper_path);
            let libs_dirs_rel: Vec<String> = lib_dirs.iter().map(|d| d.display().to_string()).collect();
            let wrapper_body = wrapper::render(&wrapper::WrapperInputs {
                ldrpath_env: ctx.flavor_settings.ldrpath_env,
                dl_path_fixup: &fixup,
                libs_dirs: &libs_dirs_rel,
                wrapper_basename: output_name,
                exec_prefix: "",
                exec_path: &format!(".libs/{output_name}"),
            });

            exec.scratch.push(wrapper_path.clone());

            if !ctx.dry_run {
                std::fs::write(&wrapper_path, wrapper_body)
                    .map_err(|e| SlbtError::system("bin::slibtool::run_link", e))?;
            }
        }
    }

    tracing::debug!(output = ?exec.output, rpath = ?exec.rpath, scratch = ?exec.scratch, "exec context populated");

    Ok(())
}

fn run_config(ctx: &DriverContext) -> Result<(), SlbtError> {
    let build_machine = build_machine_triplet();
    let report = config::build_report(&ctx.host, ctx.flavor, &build_machine);
    print!("{}", report.render());
    Ok(())
}

fn run_execute(ctx: &DriverContext, split: &SplitArgv) -> Result<(), SlbtError> {
    let args = &split.dargv;
    let Some((program, rest)) = args.split_first() else {
        return Err(SlbtError::custom("bin::slibtool::run_execute", ErrorKind::Flow));
    };

    let libs_dirs: Vec<String> = args
        .iter()
        .filter_map(|a| a.strip_prefix("-L").map(str::to_string))
        .collect();
    let existing = std::env::var(ctx.flavor_settings.ldrpath_env).ok();

    let req = execute::ExecuteRequest {
        ldrpath_env: ctx.flavor_settings.ldrpath_env,
        libs_dirs: &libs_dirs,
        existing_ldrpath: existing.as_deref(),
        program: std::path::Path::new(program),
        args: rest,
    };
    let status = execute::run(&req)?;
    if !status.success() {
        return Err(SlbtError::custom(
            "bin::slibtool::run_execute",
            ErrorKind::Link(status.code()),
        ));
    }
    Ok(())
}

fn extract_field<'a>(la_contents: &'a str, key: &str) -> Option<&'a str> {
    let prefix = format!("{key}=");
    la_contents
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|v| v.trim_matches('\''))
}

fn run_install(_ctx: &DriverContext, split: &SplitArgv) -> Result<(), SlbtError> {
    let args = &split.dargv;
    if args.len() < 2 {
        return Err(SlbtError::custom("bin::slibtool::run_install", ErrorKind::Install));
    }
    let la_path = PathBuf::from(&args[0]);
    let dest_dir = PathBuf::from(&args[1]);
    let la_filename = la_path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| SlbtError::custom("bin::slibtool::run_install", ErrorKind::Install))?
        .to_string();

    let la_contents =
        std::fs::read_to_string(&la_path).map_err(|e| SlbtError::system("bin::slibtool::run_install", e))?;
    let library_names: Vec<String> = extract_field(&la_contents, "library_names")
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let archive_name = extract_field(&la_contents, "old_library")
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let req = install::InstallRequest {
        source_dir: la_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        dest_dir: &dest_dir,
        la_filename: &la_filename,
        archive_name: archive_name.as_deref(),
        library_names: &library_names,
        la_contents: &la_contents,
    };
    install::run(&req)
}

fn run_uninstall(_ctx: &DriverContext, split: &SplitArgv) -> Result<(), SlbtError> {
    let args = &split.dargv;
    let la_path = args
        .first()
        .ok_or_else(|| SlbtError::custom("bin::slibtool::run_uninstall", ErrorKind::Flow))?;
    let path = PathBuf::from(la_path);
    let la_filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| SlbtError::custom("bin::slibtool::run_uninstall", ErrorKind::Flow))?
        .to_string();

    let la_contents =
        std::fs::read_to_string(&path).map_err(|e| SlbtError::system("bin::slibtool::run_uninstall", e))?;
    let library_names: Vec<String> = extract_field(&la_contents, "library_names")
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let archive_name = extract_field(&la_contents, "old_library")
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let req = uninstall::UninstallRequest {
        dir,
        la_filename: &la_filename,
        archive_name: archive_name.as_deref(),
        library_names: &library_names,
    };
    uninstall::run(&req)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let argv0 = std::env::args().next().unwrap_or_else(|| "slibtool".to_string());
    let mode = resolve_mode(cli.mode.as_deref(), &argv0);

    let host_params = derive_host(cli.host.as_deref(), cli.target.as_deref(), &argv0, None);
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut ctx = DriverContext::new(mode, host_params, cwd);
    ctx.verbosity = cli.verbose;
    ctx.no_color = ctx.no_color || cli.no_color;
    ctx.dry_run = cli.dry_run;

    let dargv = normalize_argv(&cli.rest);
    let split = split_targv_cargv(&dargv);

    let result = match mode {
        Mode::Ar => run_ar(&ctx, &split),
        Mode::Link | Mode::Compile => run_link(&ctx, &split),
        Mode::Config | Mode::Info => run_config(&ctx),
        Mode::Execute => run_execute(&ctx, &split),
        Mode::Install => run_install(&ctx, &split),
        Mode::Uninstall => run_uninstall(&ctx, &split),
        Mode::Stoolie => Err(SlbtError::custom("bin::slibtool::main", ErrorKind::Flow)),
    };

    if let Err(err) = result {
        ctx.record(SlbtError::nested("bin::slibtool::main", err));
    }
    ctx.flush_errors();
    ExitCode::from(ctx.exit_code() as u8)
}
