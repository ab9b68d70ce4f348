//! Implementation of the `ropify show-imports` command
//!
//! Lists the import statements that would bring a name into scope.

use std::io::Write;

use ropify_core::engine::ProjectSession;
use ropify_core::error::{RopifyError, RopifyResult};
use ropify_core::imports::{filter_candidates, import_statement};

/// Parsed arguments for `ropify show-imports`.
#[derive(Debug, Clone)]
pub struct ShowImportsArgs {
    pub name: String,
    /// Module prefixes hidden from the listing.
    pub vendor_prefixes: Vec<String>,
}

/// Run the show-imports command
pub fn run_show_imports(
    session: &mut dyn ProjectSession,
    out: &mut dyn Write,
    args: &ShowImportsArgs,
) -> RopifyResult<()> {
    let candidates = session.import_candidates(&args.name)?;
    let found = candidates.len();
    let modules = filter_candidates(candidates, &args.vendor_prefixes);
    tracing::debug!(name = %args.name, found, kept = modules.len(), "import candidates");

    if modules.is_empty() {
        return Err(RopifyError::guard(format!(
            "No modules found for `{}`",
            args.name
        )));
    }

    for module in &modules {
        writeln!(out, "{}", import_statement(module, &args.name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{output, FakeSession};

    fn args(name: &str) -> ShowImportsArgs {
        ShowImportsArgs {
            name: name.to_string(),
            vendor_prefixes: vec!["site-packages".to_string()],
        }
    }

    #[test]
    fn test_one_line_per_candidate() {
        let mut session = FakeSession::new();
        session.candidates = vec![
            "app.text".to_string(),
            "site-packages.slugify".to_string(),
            "lib.text".to_string(),
        ];
        let mut out = Vec::new();

        run_show_imports(&mut session, &mut out, &args("slugify")).unwrap();

        assert_eq!(
            output(&out),
            "from app.text import slugify\nfrom lib.text import slugify\n"
        );
    }

    #[test]
    fn test_repeated_module_is_listed_once() {
        let mut session = FakeSession::new();
        session.candidates = vec![
            "lib.text".to_string(),
            "app.text".to_string(),
            "lib.text".to_string(),
        ];
        let mut out = Vec::new();

        run_show_imports(&mut session, &mut out, &args("slugify")).unwrap();

        assert_eq!(
            output(&out),
            "from lib.text import slugify\nfrom app.text import slugify\n"
        );
    }

    #[test]
    fn test_no_candidates_is_guard_with_empty_output() {
        let mut session = FakeSession::new();
        let mut out = Vec::new();

        let err = run_show_imports(&mut session, &mut out, &args("nothing")).unwrap_err();

        assert!(err.is_guard());
        assert_eq!(err.to_string(), "No modules found for `nothing`");
        assert!(out.is_empty());
    }

    #[test]
    fn test_only_vendored_candidates_is_guard() {
        let mut session = FakeSession::new();
        session.candidates = vec!["site-packages.requests".to_string()];
        let mut out = Vec::new();

        let err = run_show_imports(&mut session, &mut out, &args("get")).unwrap_err();

        assert_eq!(err.exit_status().code(), 1);
        assert!(out.is_empty());
    }
}
