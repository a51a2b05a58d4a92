//! Exit code constants for the runcap CLI.
//!
//! These are the codes of runcap itself, not of the command it runs:
//! - 0: The command was launched (or failed to launch) and a record was printed
//! - 1: Internal failure (runtime could not start, record could not be written)
//! - 3: Malformed invocation; usage was printed and no record was emitted
//!
//! The command's own outcome is reported inside the JSON record (`rs`).

/// A record was emitted, whatever the command's outcome.
pub const SUCCESS: i32 = 0;

/// runcap could not produce a record for reasons unrelated to the command.
pub const INTERNAL_FAILURE: i32 = 1;

/// Bad arguments: unknown flag, missing timeout value, bad duration, no command.
pub const USAGE_ERROR: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, INTERNAL_FAILURE, USAGE_ERROR];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn usage_error_is_three() {
        assert_eq!(USAGE_ERROR, 3);
    }
}
