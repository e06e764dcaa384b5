mod error;
mod listing;
mod log;
mod manager;
mod repository;
mod spec;

pub use error::{find_pak_error, PakError};
pub use listing::{compare_ids, search, sorted_specs};
pub use log::{LogFacade, NoopLogger, PakLogger};
pub use manager::Manager;
pub use repository::{
    Deleter, FileGetter, FileStream, FileWriter, InstalledLister, InstalledManifestGetter,
    LocalRepository, ManifestGetter, ManifestWriter, SourceRepository, SpecGetter,
};
pub use spec::{InstallSpec, Manifest, PakTime, Spec, SpecIndex, UpgradableSpec};
