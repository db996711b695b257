//! Binary that emits command-line options markdown to stdout.
//!
//! Pipe it into the user guide when the options change.

fn main() {
    print!("{}", datakit_cli::render_options_markdown());
}
