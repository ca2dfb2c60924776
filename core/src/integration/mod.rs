//! End-to-end session tests
//!
//! Every test drives a [`MovieSession`](crate::MovieSession) over a
//! [`TestHost`](crate::test_utils::TestHost) the way an emulator would:
//! poll peripherals, then tick once per frame.
