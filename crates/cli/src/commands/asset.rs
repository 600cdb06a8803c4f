//! Media host id lookup.
//!
//! Shows which id a stored URL maps to, which is the id the editors delete
//! when the URL loses its owner.

use vitrine_core::asset_id;

use super::CliError;

/// Print the media host id for `url`.
///
/// # Errors
///
/// Returns `CliError::Unresolvable` when the URL has no `/upload/` segment.
pub fn resolve(url: &str) -> Result<(), CliError> {
    let id = asset_id::resolve(url).ok_or_else(|| CliError::Unresolvable(url.to_owned()))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_url_without_upload_segment() {
        assert!(matches!(
            resolve("https://legacy.test/images/logo.png"),
            Err(CliError::Unresolvable(_))
        ));
        assert!(resolve("https://res.cloudinary.com/d/image/upload/v1/f/n.jpg").is_ok());
    }
}
