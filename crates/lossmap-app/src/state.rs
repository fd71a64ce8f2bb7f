// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// The dashboard's focusable panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Map,
    Ranked,
    Search,
    Chart,
}

impl PanelKind {
    pub const ALL: [Self; 4] = [Self::Map, Self::Ranked, Self::Search, Self::Chart];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Ranked => "ranked",
            Self::Search => "search",
            Self::Chart => "chart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub focus: PanelKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            focus: PanelKind::Map,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextPanel,
    PrevPanel,
    FocusPanel(PanelKind),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    FocusChanged(PanelKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextPanel => self.rotate_focus(1),
            AppCommand::PrevPanel => self.rotate_focus(-1),
            AppCommand::FocusPanel(panel) => {
                self.focus = panel;
                vec![AppEvent::FocusChanged(panel)]
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_focus(&mut self, delta: isize) -> Vec<AppEvent> {
        let panels = PanelKind::ALL;
        let current = panels
            .iter()
            .position(|panel| *panel == self.focus)
            .unwrap_or(0) as isize;
        let len = panels.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.focus = panels[next];
        vec![AppEvent::FocusChanged(self.focus)]
    }
}
