// We are writing a very specific, well defined format, so it makes it easier to
// see exactly what is being written if we explicitly write out `\n` instead of
// hoping somebody notices the `writeln!` instead of `write!`.
#![allow(clippy::write_with_newline)]
#![allow(clippy::too_many_arguments)]

mod alignment;

pub mod archive;
pub mod driver;
pub mod host;
pub mod link;
pub mod modes;

pub use archive::armap::{Armap, ArmapEndian, ArmapSymbol, ArmapVariant};
pub use archive::kind::{ArchiveKind, MemberAttribute, ObjectFormat};
pub use archive::merge::merge_archives;
pub use archive::meta::{ArchiveMeta, MemberInfo};
pub use archive::writer::{build_archive, commit_archive, BuildMember, BuildSymbol};
pub use driver::context::DriverContext;
pub use driver::error::{ErrorKind, SlbtError};
pub use host::flavor::{Flavor, FlavorSettings};
pub use link::planner::{choose_output_policy, plan, LinkRequest, OutputPolicy, PlannedLink};
