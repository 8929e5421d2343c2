//! Envelope status codes.
//!
//! Every non-raw response carries a numeric `status`. `0` means success; the
//! rest of `0..APP_FLOOR` is reserved for outcomes the framework itself
//! produces. Applications define their own codes at or above
//! [`Status::APP_FLOOR`] so the two ranges never collide.
//!
//! ```rust
//! use reef::Status;
//!
//! const USER_BANNED: Status = Status::app(10_001);
//!
//! assert!(Status::SUCCESS.is_success());
//! assert!(Status::INVALID_PARAM.is_reserved());
//! assert!(!USER_BANNED.is_reserved());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A response status code.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(i64);

impl Status {
    // ── Framework-reserved ────────────────────────────────────────────────────
    pub const SUCCESS: Status        = Status(0); // the only success value
    pub const ERROR_UNKNOWN: Status  = Status(1); // a filter aborted without saying why
    pub const ERROR_DB: Status       = Status(2); // storage failure, set by filters
    pub const INVALID_PARAM: Status  = Status(3); // a Checker or rule rejected a value
    pub const INVALID_STATUS: Status = Status(4); // the response's own status failed its rule

    /// First code available to applications.
    pub const APP_FLOOR: i64 = 10_000;

    /// Every framework-reserved code, in descending order.
    pub const RESERVED: [Status; 5] = [
        Status::INVALID_STATUS,
        Status::INVALID_PARAM,
        Status::ERROR_DB,
        Status::ERROR_UNKNOWN,
        Status::SUCCESS,
    ];

    /// An application-defined code. Values below [`Status::APP_FLOOR`] are
    /// still accepted but will read as reserved.
    pub const fn app(code: i64) -> Self {
        Status(code)
    }

    pub const fn code(self) -> i64 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    pub const fn is_reserved(self) -> bool {
        self.0 >= 0 && self.0 < Self::APP_FLOOR
    }
}

impl From<i64> for Status {
    fn from(code: i64) -> Self {
        Status(code)
    }
}

impl From<Status> for i64 {
    fn from(s: Status) -> i64 {
        s.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_and_app_ranges_do_not_overlap() {
        for s in Status::RESERVED {
            assert!(s.is_reserved(), "{s} should be reserved");
        }
        assert!(!Status::app(Status::APP_FLOOR).is_reserved());
        assert!(Status::app(9_999).is_reserved());
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&Status::INVALID_PARAM).unwrap();
        assert_eq!(json, "3");
        let back: Status = serde_json::from_str("10002").unwrap();
        assert_eq!(back, Status::app(10_002));
    }
}
