mod attachment;
mod request;
mod status_log;

pub use attachment::{NewRequestAttachment, RequestAttachment};
pub use request::{
    MaintenanceRequest, NewMaintenanceRequest, RequestId, RequestPriority, RequestStatus,
};
pub use status_log::{NewStatusLogEntry, StatusLogEntry};
