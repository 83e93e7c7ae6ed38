//! `kolkit_io_fs` v1:
//! Host save targets for finished export documents.
//!
//! Modules:
//! - `spec`   : options, artifact, errors
//! - `report` : save counters
//! - `util`   : file name and destination checks
//! - `save`   : `SaveTarget`, `trigger_download`, directory/memory targets
pub mod report;
pub mod save;
pub mod spec;
pub mod util;

pub use report::{ReportSave, ReportSaveBuilder};
pub use save::{DirectorySaveTarget, MemorySaveTarget, SaveTarget, trigger_download};
pub use spec::{
    EnumSaveConflictStrategy, SaveError, SpecExportArtifact, SpecSaveError, SpecSaveOptions,
};
pub use util::{N_LEN_FILENAME_MAX, validate_filename};
