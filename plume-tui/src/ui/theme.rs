use ratatui::style::Color;

pub struct ThemeColors {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub text: Color,
    pub text_dim: Color,
    pub background: Color,
    pub border: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub like: Color,
}

/// Dark palette with blue accents
pub fn get_theme_colors() -> ThemeColors {
    ThemeColors {
        primary: Color::Rgb(100, 200, 255),   // Light blue
        secondary: Color::Rgb(150, 150, 255), // Purple-blue
        accent: Color::Rgb(255, 100, 200),    // Pink
        text: Color::Rgb(220, 220, 220),      // Light gray
        text_dim: Color::Rgb(120, 120, 120),  // Medium gray
        background: Color::Rgb(20, 20, 25),   // Very dark blue-gray
        border: Color::Rgb(60, 60, 70),
        success: Color::Rgb(100, 255, 150),
        warning: Color::Rgb(255, 200, 100),
        error: Color::Rgb(255, 100, 100),
        like: Color::Rgb(255, 80, 110),
    }
}
