//! `System` CRD type definition.

pub mod spec;
pub mod status;

pub use spec::{
    DatabaseSpec, FileStorageSpec, HighAvailabilitySpec, MailSpec, MysqlSpec, PostgresqlSpec,
    PvcSpec, S3Spec, SecretRef, System, SystemSpec,
};
pub use status::{SystemCondition, SystemStatus};
