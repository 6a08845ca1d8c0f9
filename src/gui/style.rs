use iced::{Background, Border, Color, Shadow, Theme};
use iced::widget::button;
use iced::widget::container;

pub const AMBER: Color = Color { r: 1.0, g: 0.69, b: 0.0, a: 1.0 };
pub const NEEDLE_RED: Color = Color { r: 0.82, g: 0.19, b: 0.13, a: 1.0 };
pub const DIM: Color = Color { r: 0.33, g: 0.33, b: 0.33, a: 1.0 };

/// Station rows: the whole row is a button, but it should read as text.
pub struct TextButtonStyleSheet;

impl button::StyleSheet for TextButtonStyleSheet {
    type Style = Theme;

    fn active(&self, style: &Self::Style) -> button::Appearance {
        button::Appearance {
            shadow_offset: Default::default(),
            background: None,
            text_color: style.palette().text,
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 0.0.into(),
            },
            shadow: Shadow::default(),
        }
    }

    fn hovered(&self, style: &Self::Style) -> button::Appearance {
        button::Appearance {
            text_color: AMBER,
            ..self.active(style)
        }
    }
}

/// One entry of the tuning dial. The active entry is lit.
pub struct DialItemStyleSheet {
    pub active: bool,
}

impl container::StyleSheet for DialItemStyleSheet {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        let color = if self.active { AMBER } else { DIM };

        container::Appearance {
            text_color: Some(color),
            background: if self.active { Some(Background::Color(Color { a: 0.12, ..AMBER })) } else { None },
            border: Border {
                color,
                width: 1.0,
                radius: 4.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}
