// Working fund viewer
//
// Desktop client for GET /getWorkingFund. Fetches once on startup and shows
// nothing, a loading line, the error, or the fund.

use blanket::config::LoggingSettings;
use blanket::{logging, RemoteData, WorkingFund};
use chrono::{DateTime, Local};
use iced::widget::{button, column, container, row, text, Column, Space};
use iced::{executor, window, Application, Command, Element, Length, Settings, Theme};
use log::{info, warn};
use serde::Deserialize;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const ENDPOINT_VAR: &str = "BLANKET_WORKING_FUND_URL";
const DEFAULT_ENDPOINT: &str = "http://localhost:8080/getWorkingFund";

pub fn main() -> iced::Result {
    if let Err(e) = logging::init_logging(&LoggingSettings::default()) {
        eprintln!("Logging disabled: {}", e);
    }

    let endpoint = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ENDPOINT_VAR).ok())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    WorkingFundViewer::run(Settings {
        window: window::Settings {
            size: (480, 320),
            resizable: true,
            ..Default::default()
        },
        ..Settings::with_flags(endpoint)
    })
}

struct WorkingFundViewer {
    endpoint: String,
    working_fund: RemoteData<String, WorkingFund>,
    fetched_at: Option<DateTime<Local>>,
    is_dark_mode: bool,
}

#[derive(Debug, Clone)]
enum Message {
    WorkingFundLoaded(Result<WorkingFund, String>),
    ToggleTheme,
}

impl Application for WorkingFundViewer {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = String;

    fn new(endpoint: String) -> (Self, Command<Message>) {
        let mut working_fund = RemoteData::NotStarted;
        // Pending is set before the request goes out.
        working_fund.start();
        info!("Fetching working fund from {}", endpoint);

        let command = Command::perform(
            fetch_working_fund(endpoint.clone()),
            Message::WorkingFundLoaded,
        );

        (
            WorkingFundViewer {
                endpoint,
                working_fund,
                fetched_at: None,
                is_dark_mode: true,
            },
            command,
        )
    }

    fn title(&self) -> String {
        format!("Working Fund v{}", VERSION)
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::WorkingFundLoaded(outcome) => {
                if let Err(e) = &outcome {
                    warn!("Working fund request to {} failed: {}", self.endpoint, e);
                }
                if self.working_fund.settle(outcome) {
                    self.fetched_at = Some(Local::now());
                }
            }
            Message::ToggleTheme => {
                self.is_dark_mode = !self.is_dark_mode;
            }
        }
        Command::none()
    }

    fn view(&self) -> Element<Message> {
        let content: Element<Message> = self.working_fund.fold(
            || Column::new().into(),
            || text("Loading working fund...").size(20).into(),
            |error| {
                column![
                    text("There was an error retrieving working fund.").size(20),
                    text(error).size(14),
                ]
                .spacing(8)
                .into()
            },
            |fund| {
                column![
                    text(&fund.name).size(32),
                    text(format!("Current balance: {}", fund.amount)),
                    text(format!("Goal: {}", fund.goal)),
                ]
                .spacing(8)
                .into()
            },
        );

        let status = match self.fetched_at {
            Some(at) => format!("Updated {}", at.format("%H:%M:%S")),
            None => String::new(),
        };
        let theme_label = if self.is_dark_mode { "Light" } else { "Dark" };
        let footer = row![
            text(status).size(14),
            Space::with_width(Length::Fill),
            button(text(theme_label).size(14)).on_press(Message::ToggleTheme),
        ]
        .spacing(8);

        column![
            container(content)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x()
                .center_y(),
            footer,
        ]
        .padding(20)
        .width(Length::Fill)
        .into()
    }

    fn theme(&self) -> Theme {
        if self.is_dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Body of a failed /getWorkingFund response.
#[derive(Deserialize)]
struct FailureBody {
    error: String,
}

async fn fetch_working_fund(endpoint: String) -> Result<WorkingFund, String> {
    let fail = |detail: String| format!("Could not fetch working fund data. {}", detail);

    let response = reqwest::get(&endpoint)
        .await
        .map_err(|e| fail(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<FailureBody>(&body)
            .map(|failure| failure.error)
            .unwrap_or(body);
        return Err(fail(format!("{}: {}", status, detail)));
    }

    response
        .json::<WorkingFund>()
        .await
        .map_err(|e| fail(e.to_string()))
}
