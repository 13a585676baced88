//! Input planning that sits above individual reports.
//!
//! Code here turns a higher-level request (type this string) into the
//! ordered list of reports that realise it.  It never sleeps and never talks
//! to a transport; the app crate owns pacing and delivery.

pub mod typing;
