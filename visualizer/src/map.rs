use crate::Message;
use canopycore::dashboard::{Dashboard, MapView};
use canopycore::model::Coordinate;
use canopycore::surface::BaseLayer;
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke, Text},
    Color, Pixels, Point, Rectangle, Renderer, Size, Theme,
};

const METERS_PER_DEGREE: f64 = 111_320.0;
/// Markers are hit within this many pixels of the cursor.
const HIT_RADIUS_PX: f64 = 10.0;

/// Equirectangular projection of the visible map area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    center: Coordinate,
    deg_per_px: f64,
    size: Size,
}

impl Projection {
    pub fn new(center: Coordinate, zoom: u8, size: Size) -> Self {
        Self {
            center,
            deg_per_px: MapView { center, zoom }.deg_per_px(),
            size,
        }
    }

    pub fn to_screen(&self, coordinate: Coordinate) -> Point {
        let x = self.size.width as f64 / 2.0 + (coordinate.lng - self.center.lng) / self.deg_per_px;
        let y = self.size.height as f64 / 2.0 - (coordinate.lat - self.center.lat) / self.deg_per_px;
        Point::new(x as f32, y as f32)
    }

    pub fn to_geo(&self, point: Point) -> Coordinate {
        let lng = self.center.lng + (point.x as f64 - self.size.width as f64 / 2.0) * self.deg_per_px;
        let lat = self.center.lat - (point.y as f64 - self.size.height as f64 / 2.0) * self.deg_per_px;
        Coordinate::new(lat.clamp(-90.0, 90.0), lng.clamp(-180.0, 180.0))
    }

    pub fn meters_to_px(&self, meters: f64) -> f32 {
        (meters / METERS_PER_DEGREE / self.deg_per_px) as f32
    }

    pub fn hit_tolerance_deg(&self) -> f64 {
        HIT_RADIUS_PX * self.deg_per_px
    }

    /// Graticule spacing that keeps lines roughly 80 px apart.
    fn grid_step(&self) -> f64 {
        let target = self.deg_per_px * 80.0;
        [0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]
            .into_iter()
            .find(|step| *step >= target)
            .unwrap_or(30.0)
    }
}

fn rgb(color: (u8, u8, u8)) -> Color {
    Color::from_rgb8(color.0, color.1, color.2)
}

fn background(layer: BaseLayer) -> (Color, Color) {
    match layer {
        BaseLayer::OpenStreetMap => (
            Color::from_rgb8(0xf2, 0xef, 0xe9),
            Color::from_rgb8(0xc8, 0xc4, 0xbc),
        ),
        BaseLayer::Satellite => (
            Color::from_rgb8(0x1d, 0x2b, 0x1f),
            Color::from_rgb8(0x3a, 0x4a, 0x3c),
        ),
    }
}

/// Map canvas: base layer, detection overlays, drawn polygon and draft.
pub struct MapCanvas<'a> {
    dashboard: &'a Dashboard,
}

impl<'a> MapCanvas<'a> {
    pub fn new(dashboard: &'a Dashboard) -> Self {
        Self { dashboard }
    }

    fn projection(&self, size: Size) -> Projection {
        let view = self.dashboard.view();
        Projection::new(view.center, view.zoom, size)
    }

    fn ring_path(projection: &Projection, points: &[Coordinate], close: bool) -> Path {
        Path::new(|builder| {
            for (i, point) in points.iter().enumerate() {
                let screen = projection.to_screen(*point);
                if i == 0 {
                    builder.move_to(screen);
                } else {
                    builder.line_to(screen);
                }
            }
            if close {
                builder.close();
            }
        })
    }
}

impl<'a> canvas::Program<Message> for MapCanvas<'a> {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &iced::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        if let iced::Event::Mouse(mouse::Event::CursorMoved { .. }) = event {
            let (width, height) = self.dashboard.viewport_size();
            if (width - bounds.width as f64).abs() > 0.5 || (height - bounds.height as f64).abs() > 0.5
            {
                return Some(canvas::Action::publish(Message::ViewportResized(bounds.size())));
            }
        }
        let position = cursor.position_in(bounds)?;
        let projection = self.projection(bounds.size());
        match event {
            iced::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let coordinate = projection.to_geo(position);
                Some(
                    canvas::Action::publish(Message::MapClicked(
                        coordinate,
                        projection.hit_tolerance_deg(),
                    ))
                    .and_capture(),
                )
            }
            iced::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                let y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } | mouse::ScrollDelta::Pixels { y, .. } => *y,
                };
                let step = if y > 0.0 { 1 } else if y < 0.0 { -1 } else { 0 };
                (step != 0)
                    .then(|| canvas::Action::publish(Message::Zoom(step)).and_capture())
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let projection = self.projection(bounds.size());
        let layer = self.dashboard.base_layer();
        let (fill, grid) = background(layer);
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), fill);

        let step = projection.grid_step();
        let top_left = projection.to_geo(Point::ORIGIN);
        let bottom_right = projection.to_geo(Point::new(bounds.width, bounds.height));
        let graticule = Path::new(|builder| {
            let mut lng = (top_left.lng / step).floor() * step;
            while lng <= bottom_right.lng {
                let x = projection.to_screen(Coordinate::new(0.0, lng)).x;
                builder.move_to(Point::new(x, 0.0));
                builder.line_to(Point::new(x, bounds.height));
                lng += step;
            }
            let mut lat = (bottom_right.lat / step).floor() * step;
            while lat <= top_left.lat {
                let y = projection.to_screen(Coordinate::new(lat, 0.0)).y;
                builder.move_to(Point::new(0.0, y));
                builder.line_to(Point::new(bounds.width, y));
                lat += step;
            }
        });
        frame.stroke(&graticule, Stroke::default().with_color(grid).with_width(1.0));

        if let Some(area) = self.dashboard.selected_area() {
            let path = Self::ring_path(&projection, area, true);
            frame.fill(&path, Color::from_rgba(0.2, 0.6, 0.86, 0.12));
            frame.stroke(
                &path,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(0.2, 0.6, 0.86)),
            );
        }

        let draft = self.dashboard.draft().vertices();
        if !draft.is_empty() {
            frame.stroke(
                &Self::ring_path(&projection, draft, false),
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(0.9, 0.4, 0.1)),
            );
            for vertex in draft {
                let dot = Path::circle(projection.to_screen(*vertex), 4.0);
                frame.fill(&dot, Color::from_rgb(0.9, 0.4, 0.1));
            }
        }

        let selected = self
            .dashboard
            .selected_overlay()
            .map(|overlay| overlay.site_id.as_str());
        for overlay in self.dashboard.overlays() {
            let center = projection.to_screen(overlay.position);
            let color = rgb(overlay.icon.risk.rgb());

            let impact = Path::circle(center, projection.meters_to_px(overlay.circle.radius_m));
            frame.fill(
                &impact,
                Color {
                    a: overlay.circle.fill_opacity,
                    ..color
                },
            );
            frame.stroke(&impact, Stroke::default().with_color(color).with_width(1.0));

            let marker_radius = if selected == Some(overlay.site_id.as_str()) {
                9.0
            } else {
                6.0
            };
            frame.fill(&Path::circle(center, marker_radius), color);
            frame.fill_text(Text {
                content: overlay.icon.label.clone(),
                position: Point::new(center.x + 8.0, center.y - 14.0),
                color: Color::BLACK,
                size: Pixels(11.0),
                ..Text::default()
            });
        }

        frame.fill_text(Text {
            content: format!("{} | {}", layer, layer.attribution()),
            position: Point::new(6.0, bounds.height - 16.0),
            color: Color::from_rgb(0.4, 0.4, 0.4),
            size: Pixels(10.0),
            ..Text::default()
        });

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) && self.dashboard.draft().vertices().is_empty() {
            mouse::Interaction::Pointer
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_and_geo_round_trip() {
        let projection = Projection::new(Coordinate::new(20.0, 78.0), 5, Size::new(800.0, 600.0));
        assert_eq!(
            projection.to_screen(Coordinate::new(20.0, 78.0)),
            Point::new(400.0, 300.0)
        );
        let geo = projection.to_geo(Point::new(500.0, 200.0));
        let back = projection.to_screen(geo);
        assert!((back.x - 500.0).abs() < 0.01);
        assert!((back.y - 200.0).abs() < 0.01);
        assert!(geo.lat > 20.0 && geo.lng > 78.0);
    }

    #[test]
    fn higher_zoom_shrinks_the_hit_tolerance() {
        let size = Size::new(800.0, 600.0);
        let wide = Projection::new(Coordinate::new(0.0, 0.0), 3, size);
        let close = Projection::new(Coordinate::new(0.0, 0.0), 12, size);
        assert!(close.hit_tolerance_deg() < wide.hit_tolerance_deg());
        assert!(close.meters_to_px(500.0) > wide.meters_to_px(500.0));
    }
}
