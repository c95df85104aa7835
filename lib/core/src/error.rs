//! Error handling foundation for pidgin-tutor.
//!
//! Only the `Result` alias lives here. Each crate defines its own
//! domain error enums in an `error` module and wraps them in a
//! rootcause `Report`, adding layer context with `.context()` as
//! errors travel upward.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_works() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.expect("should be ok"), 42);
    }
}
