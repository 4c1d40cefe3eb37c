mod category;
mod notification;
mod tip;
mod video;

pub use self::category::CategoryRecord;
pub use self::notification::NotificationRecord;
pub use self::tip::TipRecord;
pub use self::video::VideoRecord;

pub(crate) use self::category::CategoryRow;
pub(crate) use self::notification::NotificationRow;
pub(crate) use self::tip::TipRow;
pub(crate) use self::video::VideoRow;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::UtcDateTime;

/// Unix-seconds column to a timestamp, naming the offending column on failure.
pub(crate) fn timestamp(seconds: i64, column: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(seconds).or_raise(|| ErrorKind::InvalidData(column))
}
