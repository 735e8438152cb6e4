use snafu::{Location, Snafu};

use crate::executor::ExecuteError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display(
        "Unsupported database backend \"{value}\", supported backends are: {}",
        allowed.join(", ")
    ))]
    UnsupportedBackend {
        value: String,
        allowed: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Unsupported partition type \"{value}\", supported types for \"{backend}\" backend are: {}",
        allowed.join(", ")
    ))]
    UnsupportedPartitionType {
        backend: String,
        value: String,
        allowed: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Unsupported partition range \"{value}\", supported partition ranges for \"{backend}\" backend are: {}",
        allowed.join(", ")
    ))]
    UnsupportedRangeGranularity {
        backend: String,
        value: String,
        allowed: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Unsupported partition range subtype \"{value}\", supported range subtypes for \"{backend}\" backend are: {}",
        allowed.join(", ")
    ))]
    UnsupportedRangeSubtype {
        backend: String,
        value: String,
        allowed: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Unsupported partition granularity \"{value}\", supported granularities are: {}", allowed.join(", ")))]
    UnsupportedGranularity {
        value: String,
        allowed: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Unsupported partition show type \"{value}\", supported show types are: {}", allowed.join(", ")))]
    UnsupportedShow {
        value: String,
        allowed: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Undefined partition column \"{value}\" in \"{model}\" model, available columns are: {}",
        allowed.join(", ")
    ))]
    InvalidPartitionColumn {
        model: String,
        value: String,
        allowed: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid identifier \"{value}\" for {field}, identifiers must match [a-z_][a-z0-9_]*"))]
    InvalidIdentifier {
        field: &'static str,
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Unsupported partition function for column type \"{value}\", supported column types for \"{backend}\" backend are: {}",
        allowed.join(", ")
    ))]
    PartitionFunctionUnavailable {
        backend: String,
        value: String,
        allowed: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Timestamp \"{value}\" is outside of the partitionable range 0001-01-01..9999-12-31"))]
    TimestampOutOfRange {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to {operation} partitioning for table \"{table}\": {source}"))]
    ProvisioningFailed {
        table: String,
        operation: &'static str,
        source: ExecuteError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Error {
    /// 出错的配置项名称
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::UnsupportedBackend { .. } => Some("backend"),
            Error::UnsupportedPartitionType { .. } => Some("partition_type"),
            Error::UnsupportedRangeGranularity { .. } | Error::UnsupportedGranularity { .. } => Some("partition_range"),
            Error::UnsupportedRangeSubtype { .. } => Some("partition_subtype"),
            Error::UnsupportedShow { .. } => Some("partition_show"),
            Error::InvalidPartitionColumn { .. } | Error::PartitionFunctionUnavailable { .. } => {
                Some("partition_column")
            }
            Error::InvalidIdentifier { field, .. } => Some(*field),
            Error::TimestampOutOfRange { .. } | Error::ProvisioningFailed { .. } => None,
        }
    }

    /// 当前后端允许的取值
    pub fn allowed_values(&self) -> Option<&[String]> {
        match self {
            Error::UnsupportedBackend { allowed, .. }
            | Error::UnsupportedPartitionType { allowed, .. }
            | Error::UnsupportedRangeGranularity { allowed, .. }
            | Error::UnsupportedRangeSubtype { allowed, .. }
            | Error::UnsupportedGranularity { allowed, .. }
            | Error::UnsupportedShow { allowed, .. }
            | Error::InvalidPartitionColumn { allowed, .. }
            | Error::PartitionFunctionUnavailable { allowed, .. } => Some(allowed.as_slice()),
            Error::InvalidIdentifier { .. } | Error::TimestampOutOfRange { .. } | Error::ProvisioningFailed { .. } => {
                None
            }
        }
    }

    /// 配置类错误在解析阶段产生, 写入之前即可发现
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Error::TimestampOutOfRange { .. } | Error::ProvisioningFailed { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_value_backend_and_allowed_values() {
        let err = UnsupportedRangeGranularitySnafu {
            backend: "mysql",
            value: "fortnight",
            allowed: vec!["day".to_string(), "week".to_string()],
        }
        .build();

        assert_eq!(
            err.to_string(),
            "Unsupported partition range \"fortnight\", supported partition ranges for \"mysql\" backend are: day, week"
        );
        assert_eq!(err.field(), Some("partition_range"));
        assert_eq!(err.allowed_values().map(<[String]>::len), Some(2));
        assert!(err.is_configuration());
    }

    #[test]
    fn provisioning_failure_keeps_source() {
        let source = crate::executor::StatementSnafu { message: "permission denied" }.build();
        let err = Error::ProvisioningFailed {
            table: "events".to_string(),
            operation: "create",
            source,
            location: snafu::location!(),
        };

        assert!(err.to_string().contains("permission denied"));
        assert!(!err.is_configuration());
        assert!(err.allowed_values().is_none());
    }
}
