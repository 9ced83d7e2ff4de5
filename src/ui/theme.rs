use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// `NO_COLOR` wins over `MESHDB_COLOR`
    pub fn from_env() -> Self {
        if std::env::var_os("NO_COLOR").is_some() {
            return ColorChoice::Never;
        }
        Self::parse(std::env::var("MESHDB_COLOR").ok().as_deref())
    }

    /// Unknown or missing values fall back to `Auto`
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("always") => ColorChoice::Always,
            Some("never") => ColorChoice::Never,
            _ => ColorChoice::Auto,
        }
    }

    pub fn enabled(self, is_term: bool) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => is_term,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    /// Field labels in status lines
    pub label: Style,
    /// Values worth spotting: ids, paths, counts
    pub accent: Style,
}

impl Theme {
    pub fn detect() -> Self {
        Self::for_choice(ColorChoice::from_env(), console::Term::stdout().is_term())
    }

    pub fn for_choice(choice: ColorChoice, is_term: bool) -> Self {
        if choice.enabled(is_term) {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            label: Style::new().white().dimmed(),
            accent: Style::new().magenta(),
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            header: none,
            success: none,
            error: none,
            warn: none,
            label: none,
            accent: none,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
