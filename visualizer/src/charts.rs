use crate::Message;
use canopycore::model::RiskLevel;
use canopycore::render::ChartSeries;
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke, Text},
    Color, Pixels, Point, Rectangle, Renderer, Size, Theme,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    /// One bar per label, colored by risk when the labels are risk levels.
    Bars,
    Line,
}

/// Draws one [`ChartSeries`] with its title.
pub struct ChartCanvas<'a> {
    series: Option<&'a ChartSeries>,
    style: ChartStyle,
}

impl<'a> ChartCanvas<'a> {
    pub fn new(series: Option<&'a ChartSeries>, style: ChartStyle) -> Self {
        Self { series, style }
    }
}

fn bar_color(label: &str) -> Color {
    match label.to_ascii_lowercase().as_str() {
        "high risk" | "high" | "medium risk" | "medium" | "low risk" | "low" => {
            let level = RiskLevel::from_label(label.split_whitespace().next().unwrap_or(label));
            let (r, g, b) = level.rgb();
            Color::from_rgb8(r, g, b)
        }
        _ => Color::from_rgb(0.18, 0.72, 0.89),
    }
}

fn label(frame: &mut Frame, content: String, position: Point, size: f32) {
    frame.fill_text(Text {
        content,
        position,
        color: Color::from_rgb(0.75, 0.75, 0.8),
        size: Pixels(size),
        ..Text::default()
    });
}

impl<'a> canvas::Program<Message> for ChartCanvas<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let Some(series) = self.series else {
            label(
                &mut frame,
                "No data".into(),
                Point::new(8.0, bounds.height / 2.0),
                12.0,
            );
            return vec![frame.into_geometry()];
        };

        label(
            &mut frame,
            series.title.clone(),
            Point::new(8.0, 4.0),
            13.0,
        );

        let plot = Rectangle::new(
            Point::new(8.0, 22.0),
            Size::new(bounds.width - 16.0, bounds.height - 40.0),
        );
        let max = series.max().max(f64::EPSILON);
        let count = series.values.len();
        if count == 0 {
            return vec![frame.into_geometry()];
        }

        match self.style {
            ChartStyle::Bars => {
                let slot = plot.width / count as f32;
                for (i, (value, name)) in series.values.iter().zip(&series.labels).enumerate() {
                    let height = (value / max) as f32 * plot.height;
                    let x = plot.x + i as f32 * slot + slot * 0.15;
                    frame.fill_rectangle(
                        Point::new(x, plot.y + plot.height - height),
                        Size::new(slot * 0.7, height),
                        bar_color(name),
                    );
                    label(
                        &mut frame,
                        name.clone(),
                        Point::new(x, plot.y + plot.height + 2.0),
                        10.0,
                    );
                }
            }
            ChartStyle::Line => {
                let step = if count > 1 {
                    plot.width / (count as f32 - 1.0)
                } else {
                    0.0
                };
                let path = Path::new(|builder| {
                    for (i, value) in series.values.iter().enumerate() {
                        let x = plot.x + i as f32 * step;
                        let y = plot.y + plot.height - (value / max) as f32 * plot.height;
                        if i == 0 {
                            builder.move_to(Point::new(x, y));
                        } else {
                            builder.line_to(Point::new(x, y));
                        }
                    }
                });
                frame.stroke(
                    &path,
                    Stroke::default()
                        .with_width(2.0)
                        .with_color(Color::from_rgb(0.18, 0.72, 0.89)),
                );
                if let (Some(first), Some(last)) = (series.labels.first(), series.labels.last()) {
                    label(
                        &mut frame,
                        first.clone(),
                        Point::new(plot.x, plot.y + plot.height + 2.0),
                        10.0,
                    );
                    label(
                        &mut frame,
                        last.clone(),
                        Point::new(plot.x + plot.width - 32.0, plot.y + plot.height + 2.0),
                        10.0,
                    );
                }
            }
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_labels_use_risk_colors() {
        assert_eq!(bar_color("High Risk"), Color::from_rgb8(0xe7, 0x4c, 0x3c));
        assert_eq!(bar_color("low"), Color::from_rgb8(0x2e, 0xcc, 0x71));
        assert_eq!(bar_color("Soil Carbon"), Color::from_rgb(0.18, 0.72, 0.89));
    }
}
