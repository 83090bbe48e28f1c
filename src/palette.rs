use ratatui::style::Color;

use crate::composer::ChartSeries;

// Scheme lifted from tableau-style chart palettes; index 0 is the "ink"
// color, 1 the alert red, the rest cycle through the service series.
const COLORS_LIGHT: [Color; 13] = [
    Color::Rgb(0, 0, 0),
    Color::Rgb(214, 39, 40),
    Color::Rgb(78, 159, 80),
    Color::Rgb(135, 209, 128),
    Color::Rgb(252, 198, 109),
    Color::Rgb(60, 168, 188),
    Color::Rgb(152, 217, 228),
    Color::Rgb(148, 163, 35),
    Color::Rgb(195, 206, 61),
    Color::Rgb(160, 132, 0),
    Color::Rgb(247, 212, 42),
    Color::Rgb(38, 137, 126),
    Color::Rgb(141, 191, 168),
];

const COLORS_DARK: [Color; 11] = [
    Color::Rgb(255, 255, 255),
    Color::Rgb(214, 39, 40),
    Color::Rgb(42, 92, 68),
    Color::Rgb(72, 133, 109),
    Color::Rgb(110, 176, 152),
    Color::Rgb(162, 220, 194),
    Color::Rgb(255, 255, 224),
    Color::Rgb(223, 201, 226),
    Color::Rgb(185, 151, 214),
    Color::Rgb(144, 107, 180),
    Color::Rgb(101, 74, 108),
];

/// Active color scheme, passed explicitly wherever series get styled so
/// there is no process-wide mutable color mode to race against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    colors: &'static [Color],
    dark: bool,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            colors: &COLORS_LIGHT,
            dark: false,
        }
    }

    pub fn dark() -> Self {
        Self {
            colors: &COLORS_DARK,
            dark: true,
        }
    }

    pub fn for_mode(dark: bool) -> Self {
        if dark { Self::dark() } else { Self::light() }
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    pub fn series_colors(&self) -> usize {
        self.colors.len()
    }

    pub fn color(&self, index: usize) -> Color {
        self.colors[index % self.colors.len()]
    }

    pub fn text(&self) -> Color {
        if self.dark {
            Color::Rgb(221, 221, 221)
        } else {
            Color::Rgb(102, 102, 102)
        }
    }

    /// Resolve a series' colors from its scheme index. The index survives
    /// theme switches so a restyle just re-runs this with the other palette.
    pub fn apply_scheme(&self, series: &mut ChartSeries, index: usize) {
        series.color_index = index;
        series.color = self.color(index);
    }
}
