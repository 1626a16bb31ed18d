use canopycore::client::Backend;
use canopycore::config::DashboardConfig;
use canopycore::dashboard::{
    AnalysisCompletion, Dashboard, ImageCompletion, NoticeKind, PendingAnalysis, MONITOR_INTERVAL,
};
use canopycore::mock::MockAnalysisService;
use canopycore::model::{Coordinate, DetectionMode, ImageUpload, TimeRange};
use canopycore::render::ChartKind;
use canopycore::selection::SelectionState;
use canopycore::surface::StatKind;
use charts::{ChartCanvas, ChartStyle};
use iced::{
    time,
    widget::{
        button, column, image, pick_list, row, scrollable, slider, text, text_input, Canvas,
        Column, Container, Row,
    },
    Alignment, Element, Length, Size, Subscription, Task, Theme,
};
use map::MapCanvas;
use std::fmt;
use std::time::Duration;

mod charts;
mod map;

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Canopy Watch".into()
}

fn application_subscription(state: &Visualizer) -> Subscription<Message> {
    let period = if state.animating {
        Duration::from_millis(33)
    } else {
        Duration::from_millis(500)
    };
    let tick = time::every(period).map(|_| Message::Tick);
    if state.dashboard.is_monitoring() {
        Subscription::batch([
            tick,
            time::every(MONITOR_INTERVAL).map(|_| Message::MonitorTick),
        ])
    } else {
        tick
    }
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

/// Time windows offered in the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeChoice {
    Day,
    TwoDays,
    Week,
    Month,
}

impl RangeChoice {
    const ALL: [RangeChoice; 4] = [
        RangeChoice::Day,
        RangeChoice::TwoDays,
        RangeChoice::Week,
        RangeChoice::Month,
    ];

    fn time_range(self) -> TimeRange {
        match self {
            RangeChoice::Day => TimeRange::Hours(24),
            RangeChoice::TwoDays => TimeRange::Hours(48),
            RangeChoice::Week => TimeRange::Hours(168),
            RangeChoice::Month => TimeRange::Label("Last Month".into()),
        }
    }

    fn matching(range: &TimeRange) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|choice| &choice.time_range() == range)
    }
}

impl fmt::Display for RangeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RangeChoice::Day => "Last 24 hours",
            RangeChoice::TwoDays => "Last 48 hours",
            RangeChoice::Week => "Last week",
            RangeChoice::Month => "Last month",
        })
    }
}

struct Visualizer {
    dashboard: Dashboard,
    backend: Backend,
    image_path: String,
    animating: bool,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    ToggleSelection,
    FinishShape,
    CancelDrawing,
    /// Click position and the hit tolerance at the current zoom.
    MapClicked(Coordinate, f64),
    Zoom(i8),
    ViewportResized(Size),
    ToggleMonitoring,
    MonitorTick,
    ModeSelected(DetectionMode),
    SensitivityChanged(f64),
    RangeSelected(RangeChoice),
    AnalysisFinished(AnalysisCompletion),
    ImagePathChanged(String),
    AnalyzeImage,
    ImageLoaded(Result<ImageUpload, String>),
    ImageFinished(ImageCompletion),
    ClearResults,
    ToggleBaseLayer,
    FocusSelected,
    ClosePopup,
    DismissNotice(u64),
}

fn load_config() -> DashboardConfig {
    match std::env::var("CANOPY_CONFIG") {
        Ok(path) => DashboardConfig::load(&path).unwrap_or_else(|err| {
            log::warn!("{}; using defaults", err);
            DashboardConfig::default()
        }),
        Err(_) => DashboardConfig::default(),
    }
}

async fn read_upload(path: String) -> Result<ImageUpload, String> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("reading {}: {}", path, e))?;
    let file_name = std::path::Path::new(&path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or(path);
    Ok(ImageUpload::new(file_name, bytes))
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let config = load_config();
        let backend = Backend::from_config(&config).unwrap_or_else(|err| {
            log::warn!("{}; falling back to the demo generator", err);
            Backend::Mock(MockAnalysisService::default())
        });
        log::info!("analyses are answered by the {}", backend.describe());
        (
            Visualizer {
                dashboard: Dashboard::new(&config),
                backend,
                image_path: String::new(),
                animating: false,
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                state.animating = state.dashboard.tick();
                Task::none()
            }
            Message::ToggleSelection => {
                state.dashboard.toggle_selection();
                Task::none()
            }
            Message::FinishShape => state.run_pending(|dashboard| dashboard.finish_shape()),
            Message::CancelDrawing => {
                state.dashboard.cancel_drawing();
                Task::none()
            }
            Message::MapClicked(point, tolerance) => {
                if state.dashboard.selection_state() == SelectionState::Selecting {
                    state.dashboard.add_vertex(point);
                } else if state.dashboard.select_site_at(point, tolerance).is_none() {
                    state.dashboard.close_popup();
                }
                Task::none()
            }
            Message::Zoom(step) => {
                let mut view = state.dashboard.view();
                view.zoom = (view.zoom as i16 + step as i16).clamp(2, 18) as u8;
                state.dashboard.set_view(view);
                Task::none()
            }
            Message::ViewportResized(size) => {
                state
                    .dashboard
                    .set_viewport_size(size.width as f64, size.height as f64);
                Task::none()
            }
            Message::ToggleMonitoring => state.run_pending(|dashboard| dashboard.toggle_monitoring()),
            Message::MonitorTick => state.run_pending(|dashboard| dashboard.monitor_tick()),
            Message::ModeSelected(mode) => {
                state.dashboard.set_mode(mode);
                Task::none()
            }
            Message::SensitivityChanged(value) => {
                state.dashboard.set_sensitivity(value);
                Task::none()
            }
            Message::RangeSelected(choice) => {
                state.run_pending(|dashboard| dashboard.set_time_range(choice.time_range()))
            }
            Message::AnalysisFinished(completion) => {
                if let Err(err) = state.dashboard.finish(completion) {
                    log::debug!("analysis not applied: {}", err);
                }
                state.animating = true;
                Task::none()
            }
            Message::ImagePathChanged(path) => {
                state.image_path = path;
                Task::none()
            }
            Message::AnalyzeImage => {
                let path = state.image_path.trim().to_string();
                if path.is_empty() {
                    return Task::none();
                }
                Task::perform(read_upload(path), Message::ImageLoaded)
            }
            Message::ImageLoaded(Ok(upload)) => {
                let pending = state.dashboard.analyze_image(upload);
                let backend = state.backend.clone();
                Task::perform(
                    async move { pending.run(&backend).await },
                    Message::ImageFinished,
                )
            }
            Message::ImageLoaded(Err(err)) => {
                log::warn!("{}", err);
                Task::none()
            }
            Message::ImageFinished(completion) => {
                state.dashboard.finish_image(completion);
                Task::none()
            }
            Message::ClearResults => {
                state.dashboard.clear();
                Task::none()
            }
            Message::ToggleBaseLayer => {
                state.dashboard.toggle_base_layer();
                Task::none()
            }
            Message::FocusSelected => {
                if let Some(id) = state
                    .dashboard
                    .selected_overlay()
                    .map(|overlay| overlay.site_id.clone())
                {
                    state.dashboard.focus_site(&id);
                }
                Task::none()
            }
            Message::ClosePopup => {
                state.dashboard.close_popup();
                Task::none()
            }
            Message::DismissNotice(id) => {
                state.dashboard.dismiss_notice(id);
                Task::none()
            }
        }
    }

    /// Sends the request produced by `issue`, if any, on the runtime.
    fn run_pending(
        &mut self,
        issue: impl FnOnce(&mut Dashboard) -> Option<PendingAnalysis>,
    ) -> Task<Message> {
        match issue(&mut self.dashboard) {
            Some(pending) => {
                let backend = self.backend.clone();
                Task::perform(
                    async move { pending.run(&backend).await },
                    Message::AnalysisFinished,
                )
            }
            None => Task::none(),
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let dashboard = &state.dashboard;
        let settings = dashboard.settings();

        let mode_buttons = DetectionMode::ALL.iter().fold(
            Column::new().spacing(4),
            |col, mode| {
                let style = if *mode == settings.mode {
                    button::primary
                } else {
                    button::secondary
                };
                col.push(
                    button(text(mode.title()))
                        .on_press(Message::ModeSelected(*mode))
                        .style(style)
                        .width(Length::Fill),
                )
            },
        );

        let selection_label = match dashboard.selection_state() {
            SelectionState::Idle => "Select Area",
            SelectionState::Selecting => "Cancel Selection",
            SelectionState::Submitted => "Analyzing...",
        };
        let selecting = dashboard.selection_state() == SelectionState::Selecting;
        let finish_button = button("Finish Polygon").padding(8);
        let finish_button = if selecting && dashboard.draft().vertices().len() >= 3 {
            finish_button.on_press(Message::FinishShape)
        } else {
            finish_button
        };

        let image_summary: Element<'_, Message> = match dashboard.image_analysis() {
            Some((name, analysis)) => {
                let mut summary = column![
                    text(name).size(14),
                    text(format!(
                        "Deforestation: {:.2}%",
                        analysis.deforestation_percentage
                    ))
                    .size(14),
                    text(format!("Risk: {}", analysis.risk_level())).size(14),
                    text(analysis.risk_description()).size(12),
                ]
                .spacing(4);
                if let Some(confidence) = analysis.confidence {
                    summary = summary
                        .push(text(format!("Confidence: {:.0}%", confidence * 100.0)).size(12));
                }
                match analysis.mask_png() {
                    Ok(bytes) if !bytes.is_empty() => summary
                        .push(
                            image(image::Handle::from_bytes(bytes))
                                .width(Length::Fixed(200.0))
                                .height(Length::Fixed(200.0)),
                        )
                        .into(),
                    _ => summary.into(),
                }
            }
            None => text("No image analysed").size(12).into(),
        };

        let controls = column![
            text("Detection Mode").size(22),
            mode_buttons,
            text(format!("Sensitivity: {:.2}", settings.sensitivity)).size(14),
            slider(0.0..=1.0, settings.sensitivity, Message::SensitivityChanged).step(0.05),
            text("Time Range").size(14),
            pick_list(
                RangeChoice::ALL,
                RangeChoice::matching(&settings.time_range),
                Message::RangeSelected
            ),
            button(selection_label)
                .on_press(if selecting {
                    Message::CancelDrawing
                } else {
                    Message::ToggleSelection
                })
                .padding(8),
            finish_button,
            button(if dashboard.is_monitoring() {
                "Stop Detection"
            } else {
                "Start Detection"
            })
            .on_press(Message::ToggleMonitoring)
            .style(if dashboard.is_monitoring() {
                button::danger
            } else {
                button::success
            })
            .padding(8),
            button("Clear Results")
                .on_press(Message::ClearResults)
                .padding(8),
            button(text(format!("Base layer: {}", dashboard.base_layer())))
                .on_press(Message::ToggleBaseLayer)
                .padding(8),
            text("Image Analysis").size(22),
            text_input("Path to satellite image", &state.image_path)
                .on_input(Message::ImagePathChanged)
                .on_submit(Message::AnalyzeImage)
                .padding(6),
            button("Analyze Image")
                .on_press(Message::AnalyzeImage)
                .padding(8),
            image_summary,
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(300.0));

        let stats = StatKind::ALL.iter().fold(Row::new().spacing(24), |row, stat| {
            row.push(
                column![
                    text(dashboard.renderer().stats().value(*stat).to_string()).size(28),
                    text(stat.label()).size(12),
                ]
                .align_x(Alignment::Center),
            )
        });

        let water = match dashboard.water_summary() {
            Some(summary) => text(format!(
                "{} reservoirs, {:.2} million m³ total volume",
                summary.reservoirs,
                summary.total_volume_m3 / 1_000_000.0
            ))
            .size(14),
            None => text("").size(14),
        };

        let loading = if dashboard.is_loading() {
            text("Analyzing area...").size(16)
        } else {
            text("").size(16)
        };

        let map = Canvas::new(MapCanvas::new(dashboard))
            .width(Length::Fill)
            .height(Length::FillPortion(3));

        let charts = dashboard.renderer().charts();
        let chart_row = row![
            Canvas::new(ChartCanvas::new(
                charts.series(ChartKind::RiskDistribution),
                ChartStyle::Bars
            ))
            .width(Length::Fill)
            .height(Length::Fixed(180.0)),
            Canvas::new(ChartCanvas::new(
                charts.series(ChartKind::Trend),
                ChartStyle::Line
            ))
            .width(Length::Fill)
            .height(Length::Fixed(180.0)),
            Canvas::new(ChartCanvas::new(
                charts.series(ChartKind::Impact),
                ChartStyle::Bars
            ))
            .width(Length::Fill)
            .height(Length::Fixed(180.0)),
        ]
        .spacing(10);

        let center = column![
            row![loading, water].spacing(20),
            map,
            stats,
            chart_row
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let notices = dashboard.notices().active().fold(
            Column::new().spacing(6),
            |col, notice| {
                let prefix = match notice.kind {
                    NoticeKind::Geometry => "Area",
                    NoticeKind::Error => "Error",
                    NoticeKind::Info => "Info",
                };
                col.push(
                    row![
                        text(format!("{}: {}", prefix, notice.message))
                            .size(13)
                            .width(Length::Fill),
                        button("x").on_press(Message::DismissNotice(notice.id)),
                    ]
                    .spacing(6)
                    .align_y(Alignment::Center),
                )
            },
        );

        let popup: Element<'_, Message> = match dashboard.selected_overlay() {
            Some(overlay) => overlay
                .popup
                .rows
                .iter()
                .fold(
                    Column::new()
                        .spacing(4)
                        .push(text(overlay.popup.title.clone()).size(18)),
                    |col, (label, value)| col.push(text(format!("{}: {}", label, value)).size(12)),
                )
                .push(
                    row![
                        button("Focus View").on_press(Message::FocusSelected),
                        button("Close").on_press(Message::ClosePopup),
                    ]
                    .spacing(6),
                )
                .into(),
            None => text("Click a marker for details").size(12).into(),
        };

        let history = dashboard
            .activity()
            .entries()
            .rev()
            .fold(Column::new().spacing(4), |col, entry| {
                col.push(text(entry.clone()).size(12))
            });

        let metrics = dashboard.metrics().snapshot();
        let side = column![
            notices,
            text("Site Details").size(20),
            Container::new(popup).padding(6),
            text("Activity log").size(16),
            Container::new(scrollable(history).height(Length::Fixed(240.0))).padding(6),
            text(format!(
                "requests {} | applied {} | failed {} | stale {}",
                metrics.issued, metrics.applied, metrics.failed, metrics.stale
            ))
            .size(11),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(320.0));

        let layout = row![controls, center, side]
            .spacing(10)
            .align_y(Alignment::Start)
            .padding(10);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_choices_map_to_wire_values() {
        assert_eq!(RangeChoice::Day.time_range().to_string(), "24");
        assert_eq!(RangeChoice::Month.time_range().hours(), 720);
        assert_eq!(
            RangeChoice::matching(&TimeRange::Hours(168)),
            Some(RangeChoice::Week)
        );
        assert_eq!(RangeChoice::matching(&TimeRange::Hours(7)), None);
    }
}
