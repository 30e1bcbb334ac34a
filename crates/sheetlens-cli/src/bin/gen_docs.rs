//! Binary that emits command-line options markdown to stdout.
//!
//! The output replaces `docs/command-line-options.md` when the docs are rebuilt.

fn main() {
    print!("{}", sheetlens_cli::render_options_markdown());
}
