//! Color theme preference.

use tracing::info;

use seattle_trading_core::Theme;
use seattle_trading_storefront::preferences::ThemePreference;

use super::{CommandError, Storefront};

/// Print the saved theme.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn show(storefront: &Storefront) -> Result<(), CommandError> {
    info!("Theme: {}", ThemePreference::new(&storefront.store).get()?);
    Ok(())
}

/// Flip the theme.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn toggle(storefront: &Storefront) -> Result<(), CommandError> {
    let theme = ThemePreference::new(&storefront.store).toggle()?;
    info!("Theme: {theme}");
    Ok(())
}

/// Save a theme.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn set(storefront: &Storefront, theme: Theme) -> Result<(), CommandError> {
    ThemePreference::new(&storefront.store).set(theme)?;
    info!("Theme: {theme}");
    Ok(())
}
