//! Output styles using the owo-colors stylesheet pattern

use owo_colors::Style;

/// Colors used for terminal output. `Default` is the plain, uncolored sheet.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub info: Style,
    /// Secondary text such as port lists and field labels.
    pub dim: Style,
    /// Application ids and section titles.
    pub header: Style,
    /// Service types.
    pub accent: Style,
}

impl Styles {
    /// The colored stylesheet used on a color-capable terminal.
    #[must_use]
    pub fn colored() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            info: Style::new().blue(),
            dim: Style::new().dimmed(),
            header: Style::new().bold().cyan(),
            accent: Style::new().magenta(),
        }
    }
}
