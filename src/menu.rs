// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The on-device menu.
//!
//! The menu is a tree of groups and values held in one arena:
//! - Turning the encoder moves the cursor, or steps the edited value.
//! - Pushing the button descends into groups, returns, or toggles editing.
//! - Every non-root group gets a Return entry injected at the top.
//! - Accepted edits come back from [Menu::update] as changes for the
//!   caller to apply. Nothing is applied inside the menu itself.

use std::error::Error;

use tracing::debug;

use crate::config::menu::ItemConfig;
use crate::display::{Display, Row, ROWS};
use crate::panel::Panel;

/// A value change accepted by the menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Change {
    /// The key of the item that changed.
    pub key: String,

    /// The accepted value.
    pub value: Value,
}

/// The value carried by a change. Selectors report the selected index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value {
    Number(i64),
    Bool(bool),
}

/// One arena entry.
struct Item {
    key: String,
    name: String,
    kind: Kind,
}

enum Kind {
    Group {
        children: Vec<usize>,
        selected: usize,
    },
    Return {
        parent: usize,
    },
    String {
        value: String,
    },
    Bool {
        value: bool,
    },
    Number {
        value: i64,
        min: Option<i64>,
        max: Option<i64>,
    },
    Selector {
        index: i64,
        items: Vec<String>,
    },
}

/// The menu state machine.
pub struct Menu {
    items: Vec<Item>,
    current_group: usize,
    editing: Option<usize>,
    dirty: bool,
    last_position: i64,
}

impl Menu {
    /// Builds a menu from its definition.
    pub fn new(config: &ItemConfig) -> Menu {
        let mut items = Vec::new();
        build_item(&mut items, config, None);
        Menu {
            items,
            current_group: 0,
            editing: None,
            dirty: true,
            last_position: 0,
        }
    }

    /// Folds pending panel input into the menu. Returns the value changes
    /// accepted during this pass, in order.
    pub fn update(&mut self, panel: &mut dyn Panel) -> Vec<Change> {
        let mut changes = Vec::new();

        let position = panel.position();
        let delta = position - self.last_position;
        self.last_position = position;
        if delta != 0 {
            self.dirty = true;
            for _ in 0..delta.unsigned_abs() {
                if delta > 0 {
                    self.step_forward(&mut changes);
                } else {
                    self.step_back(&mut changes);
                }
            }
        }

        if panel.take_release() {
            match self.editing {
                Some(index) => {
                    debug!(key = self.items[index].key, "Leaving edit mode.");
                    self.editing = None;
                    self.dirty = true;
                }
                None => self.activate(),
            }
        }

        changes
    }

    /// Draws the visible window if anything changed since the last draw.
    /// The window is the cursor row with its two neighbors; the cursor row
    /// is inverted while its value is being edited.
    pub fn render(&mut self, display: &mut dyn Display) -> Result<(), Box<dyn Error>> {
        if !self.dirty {
            return Ok(());
        }

        let mut rows: [Option<Row>; ROWS] = [None, None, None];
        if let Kind::Group {
            children, selected, ..
        } = &self.items[self.current_group].kind
        {
            let selected = *selected;
            if selected > 0 {
                rows[0] = children
                    .get(selected - 1)
                    .map(|&child| self.make_row(child, false));
            }
            rows[1] = children
                .get(selected)
                .map(|&child| self.make_row(child, self.editing.is_some()));
            rows[2] = children
                .get(selected + 1)
                .map(|&child| self.make_row(child, false));
        }

        display.draw(&rows)?;
        self.dirty = false;
        Ok(())
    }

    /// Sets a number item without reporting a change. Out of range values
    /// are rejected.
    pub fn set_number(&mut self, key: &str, value: i64) -> bool {
        let index = match self.find(key) {
            Some(index) => index,
            None => return false,
        };
        match &mut self.items[index].kind {
            Kind::Number {
                value: slot,
                min,
                max,
            } => {
                if !in_bounds(value, *min, *max) {
                    return false;
                }
                if *slot != value {
                    *slot = value;
                    self.dirty = true;
                }
                true
            }
            _ => false,
        }
    }

    /// Sets a bool item without reporting a change.
    pub fn set_bool(&mut self, key: &str, value: bool) -> bool {
        let index = match self.find(key) {
            Some(index) => index,
            None => return false,
        };
        match &mut self.items[index].kind {
            Kind::Bool { value: slot } => {
                if *slot != value {
                    *slot = value;
                    self.dirty = true;
                }
                true
            }
            _ => false,
        }
    }

    /// Selects a selector entry by index without reporting a change.
    pub fn set_selector_index(&mut self, key: &str, value: i64) -> bool {
        let index = match self.find(key) {
            Some(index) => index,
            None => return false,
        };
        match &mut self.items[index].kind {
            Kind::Selector { index: slot, items } => {
                if value < 0 || value >= items.len() as i64 {
                    return false;
                }
                if *slot != value {
                    *slot = value;
                    self.dirty = true;
                }
                true
            }
            _ => false,
        }
    }

    /// Replaces a selector's entries, clamping the selection into range.
    pub fn set_selector_items(&mut self, key: &str, entries: Vec<String>) -> bool {
        let index = match self.find(key) {
            Some(index) => index,
            None => return false,
        };
        match &mut self.items[index].kind {
            Kind::Selector { index: slot, items } => {
                *items = entries;
                *slot = (*slot).clamp(0, (items.len() as i64 - 1).max(0));
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    fn find(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.key == key)
    }

    /// Returns the arena index of the cursor item in the current group.
    fn selected_child(&self) -> Option<usize> {
        match &self.items[self.current_group].kind {
            Kind::Group {
                children, selected, ..
            } => children.get(*selected).copied(),
            _ => None,
        }
    }

    fn step_forward(&mut self, changes: &mut Vec<Change>) {
        match self.editing {
            Some(index) => self.increment(index, changes),
            None => {
                if let Kind::Group {
                    children, selected, ..
                } = &mut self.items[self.current_group].kind
                {
                    if *selected + 1 < children.len() {
                        *selected += 1;
                    }
                }
            }
        }
    }

    fn step_back(&mut self, changes: &mut Vec<Change>) {
        match self.editing {
            Some(index) => self.decrement(index, changes),
            None => {
                if let Kind::Group { selected, .. } = &mut self.items[self.current_group].kind {
                    if *selected > 0 {
                        *selected -= 1;
                    }
                }
            }
        }
    }

    fn increment(&mut self, index: usize, changes: &mut Vec<Change>) {
        let item = &mut self.items[index];
        match &mut item.kind {
            Kind::Bool { value } => {
                if !*value {
                    *value = true;
                    changes.push(Change {
                        key: item.key.clone(),
                        value: Value::Bool(true),
                    });
                }
            }
            Kind::Number { value, min, max } => {
                let next = *value + 1;
                if in_bounds(next, *min, *max) {
                    *value = next;
                    changes.push(Change {
                        key: item.key.clone(),
                        value: Value::Number(next),
                    });
                }
            }
            Kind::Selector { index, items } => {
                let next = *index + 1;
                if next < items.len() as i64 {
                    *index = next;
                    changes.push(Change {
                        key: item.key.clone(),
                        value: Value::Number(next),
                    });
                }
            }
            _ => {}
        }
    }

    fn decrement(&mut self, index: usize, changes: &mut Vec<Change>) {
        let item = &mut self.items[index];
        match &mut item.kind {
            Kind::Bool { value } => {
                if *value {
                    *value = false;
                    changes.push(Change {
                        key: item.key.clone(),
                        value: Value::Bool(false),
                    });
                }
            }
            Kind::Number { value, min, max } => {
                let next = *value - 1;
                if in_bounds(next, *min, *max) {
                    *value = next;
                    changes.push(Change {
                        key: item.key.clone(),
                        value: Value::Number(next),
                    });
                }
            }
            Kind::Selector { index, items } => {
                let next = *index - 1;
                if next >= 0 && next < items.len() as i64 {
                    *index = next;
                    changes.push(Change {
                        key: item.key.clone(),
                        value: Value::Number(next),
                    });
                }
            }
            _ => {}
        }
    }

    /// Handles a button release while not editing.
    fn activate(&mut self) {
        let selected_index = match self.selected_child() {
            Some(index) => index,
            None => return,
        };

        match &self.items[selected_index].kind {
            Kind::Group { .. } => {
                debug!(key = self.items[selected_index].key, "Entering menu group.");
                self.current_group = selected_index;
                self.dirty = true;
            }
            Kind::Return { parent } => {
                let parent = *parent;
                debug!(key = self.items[parent].key, "Returning to menu group.");
                self.current_group = parent;
                self.dirty = true;
            }
            // Strings are labels, a push on them does nothing.
            Kind::String { .. } => {}
            _ => {
                debug!(key = self.items[selected_index].key, "Entering edit mode.");
                self.editing = Some(selected_index);
                self.dirty = true;
            }
        }
    }

    fn make_row(&self, index: usize, inverted: bool) -> Row {
        let item = &self.items[index];
        let value = match &item.kind {
            Kind::Group { .. } => String::from(">"),
            Kind::Return { .. } => String::from("<"),
            Kind::String { value } => value.clone(),
            Kind::Bool { value } => value.to_string(),
            Kind::Number { value, .. } => value.to_string(),
            Kind::Selector { index, items } => usize::try_from(*index)
                .ok()
                .and_then(|index| items.get(index))
                .cloned()
                .unwrap_or_default(),
        };

        Row {
            name: item.name.clone(),
            value,
            inverted,
        }
    }
}

/// Adds an item and its descendants to the arena, returning its index.
/// Non-root groups get a Return entry as their first child.
fn build_item(items: &mut Vec<Item>, config: &ItemConfig, parent: Option<usize>) -> usize {
    match config {
        ItemConfig::Group {
            key,
            name,
            items: child_configs,
        } => {
            let index = items.len();
            items.push(Item {
                key: key.clone(),
                name: name.clone(),
                kind: Kind::Group {
                    children: Vec::new(),
                    selected: 0,
                },
            });

            let mut children = Vec::new();
            if let Some(parent) = parent {
                let return_key = format!("return_{}", items[parent].key);
                let return_index = items.len();
                items.push(Item {
                    key: return_key,
                    name: String::from("Return"),
                    kind: Kind::Return { parent },
                });
                children.push(return_index);
            }
            for child_config in child_configs {
                children.push(build_item(items, child_config, Some(index)));
            }

            if let Kind::Group {
                children: slot, ..
            } = &mut items[index].kind
            {
                *slot = children;
            }
            index
        }
        ItemConfig::String { key, name, value } => {
            let index = items.len();
            items.push(Item {
                key: key.clone(),
                name: name.clone(),
                kind: Kind::String {
                    value: value.clone(),
                },
            });
            index
        }
        ItemConfig::Bool { key, name, value } => {
            let index = items.len();
            items.push(Item {
                key: key.clone(),
                name: name.clone(),
                kind: Kind::Bool { value: *value },
            });
            index
        }
        ItemConfig::Number {
            key,
            name,
            value,
            min,
            max,
        } => {
            let index = items.len();
            items.push(Item {
                key: key.clone(),
                name: name.clone(),
                kind: Kind::Number {
                    value: *value,
                    min: *min,
                    max: *max,
                },
            });
            index
        }
        ItemConfig::Selector {
            key,
            name,
            items: entries,
            value,
        } => {
            let selected = value
                .as_ref()
                .and_then(|value| entries.iter().position(|entry| entry == value))
                .map(|position| position as i64)
                .unwrap_or(0);
            let index = items.len();
            items.push(Item {
                key: key.clone(),
                name: name.clone(),
                kind: Kind::Selector {
                    index: selected,
                    items: entries.clone(),
                },
            });
            index
        }
    }
}

fn in_bounds(value: i64, min: Option<i64>, max: Option<i64>) -> bool {
    if let Some(min) = min {
        if value < min {
            return false;
        }
    }
    if let Some(max) = max {
        if value > max {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{display, panel};

    fn make_menu() -> Menu {
        let config: ItemConfig = serde_json::from_str(
            r#"{
                "key": "root", "name": "drumpad", "type": "group", "items": [
                    {"key": "patch", "name": "Patch", "type": "selector", "items": ["Basic", "Heavy"]},
                    {"key": "volume", "name": "Volume", "type": "number", "value": 100, "min": 0, "max": 100},
                    {"key": "midi", "name": "MIDI", "type": "group", "items": [
                        {"key": "midi_channel", "name": "Channel", "type": "number", "value": 10, "min": 1, "max": 16},
                        {"key": "midi_thru", "name": "Thru", "type": "bool", "value": false}
                    ]},
                    {"key": "version", "name": "Version", "type": "string", "value": "1.0.0"}
                ]
            }"#,
        )
        .expect("menu config");
        Menu::new(&config)
    }

    fn row_names(display: &display::test::Display) -> [Option<String>; 3] {
        let frame = display.frame().expect("frame drawn");
        [0, 1, 2].map(|index| frame[index].as_ref().map(|row| row.name.clone()))
    }

    #[test]
    fn test_initial_window() {
        let mut menu = make_menu();
        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");

        assert!(menu.update(&mut panel).is_empty());
        menu.render(&mut display).expect("render");

        assert_eq!(
            row_names(&display),
            [None, Some("Patch".to_string()), Some("Volume".to_string())]
        );
        assert_eq!(display.row(1).expect("cursor row").value, "Basic");
    }

    #[test]
    fn test_cursor_moves_and_stops_at_ends() {
        let mut menu = make_menu();
        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");

        panel.turn(1);
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        assert_eq!(display.row(1).expect("cursor row").name, "Volume");

        // Overshooting sticks to the last item.
        panel.turn(10);
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        assert_eq!(display.row(1).expect("cursor row").name, "Version");
        assert_eq!(row_names(&display)[2], None);

        panel.turn(-10);
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        assert_eq!(display.row(1).expect("cursor row").name, "Patch");
    }

    #[test]
    fn test_descend_and_return() {
        let mut menu = make_menu();
        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");

        panel.turn(2);
        panel.push();
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");

        // Inside the group the cursor starts on the injected Return entry.
        let cursor = display.row(1).expect("cursor row");
        assert_eq!(cursor.name, "Return");
        assert_eq!(cursor.value, "<");

        panel.push();
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");

        // Back at the root, the cursor is where we left it.
        let cursor = display.row(1).expect("cursor row");
        assert_eq!(cursor.name, "MIDI");
        assert_eq!(cursor.value, ">");
    }

    #[test]
    fn test_edit_number() {
        let mut menu = make_menu();
        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");

        panel.turn(1);
        panel.push();
        assert!(menu.update(&mut panel).is_empty());
        menu.render(&mut display).expect("render");
        assert!(display.row(1).expect("cursor row").inverted);

        // At the max, increments are rejected without a change.
        panel.turn(1);
        assert!(menu.update(&mut panel).is_empty());

        panel.turn(-2);
        let changes = menu.update(&mut panel);
        assert_eq!(
            changes,
            vec![
                Change {
                    key: "volume".to_string(),
                    value: Value::Number(99)
                },
                Change {
                    key: "volume".to_string(),
                    value: Value::Number(98)
                },
            ]
        );

        panel.push();
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        let cursor = display.row(1).expect("cursor row");
        assert!(!cursor.inverted);
        assert_eq!(cursor.value, "98");
    }

    #[test]
    fn test_edit_bool_reports_transitions_only() {
        let mut menu = make_menu();
        let mut panel = panel::test::Panel::get("mock");

        panel.turn(2);
        panel.push();
        menu.update(&mut panel);
        panel.turn(2);
        panel.push();
        menu.update(&mut panel);

        panel.turn(1);
        let changes = menu.update(&mut panel);
        assert_eq!(
            changes,
            vec![Change {
                key: "midi_thru".to_string(),
                value: Value::Bool(true)
            }]
        );

        // Already true, so another increment reports nothing.
        panel.turn(1);
        assert!(menu.update(&mut panel).is_empty());

        panel.turn(-1);
        let changes = menu.update(&mut panel);
        assert_eq!(
            changes,
            vec![Change {
                key: "midi_thru".to_string(),
                value: Value::Bool(false)
            }]
        );
    }

    #[test]
    fn test_edit_selector_reports_index() {
        let mut menu = make_menu();
        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");

        panel.push();
        menu.update(&mut panel);
        panel.turn(1);
        let changes = menu.update(&mut panel);
        assert_eq!(
            changes,
            vec![Change {
                key: "patch".to_string(),
                value: Value::Number(1)
            }]
        );
        menu.render(&mut display).expect("render");
        assert_eq!(display.row(1).expect("cursor row").value, "Heavy");

        // Stepping past the last entry is rejected.
        panel.turn(1);
        assert!(menu.update(&mut panel).is_empty());
    }

    #[test]
    fn test_string_item_is_inert() {
        let mut menu = make_menu();
        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");

        panel.turn(3);
        panel.push();
        assert!(menu.update(&mut panel).is_empty());
        menu.render(&mut display).expect("render");

        let cursor = display.row(1).expect("cursor row");
        assert!(!cursor.inverted);
        assert_eq!(cursor.value, "1.0.0");

        // Turning afterwards moves the cursor, not a value.
        panel.turn(-1);
        assert!(menu.update(&mut panel).is_empty());
        menu.render(&mut display).expect("render");
        assert_eq!(display.row(1).expect("cursor row").name, "MIDI");
    }

    #[test]
    fn test_set_selector_items_clamps_selection() {
        let mut menu = make_menu();

        assert!(menu.set_selector_index("patch", 1));
        assert!(menu.set_selector_items("patch", vec!["Only".to_string()]));

        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        assert_eq!(display.row(1).expect("cursor row").value, "Only");
    }

    #[test]
    fn test_programmatic_sets() {
        let mut menu = make_menu();

        assert!(menu.set_number("volume", 55));
        assert!(!menu.set_number("volume", 101));
        assert!(!menu.set_number("missing", 1));
        assert!(menu.set_bool("midi_thru", true));
        assert!(!menu.set_selector_index("patch", 5));

        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");

        panel.turn(1);
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        assert_eq!(display.row(1).expect("cursor row").value, "55");
    }

    #[test]
    fn test_no_redraw_when_clean() {
        let mut menu = make_menu();
        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");

        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        assert_eq!(display.draw_count(), 1);

        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        assert_eq!(display.draw_count(), 1);
    }

    #[test]
    fn test_empty_group_is_harmless() {
        let config: ItemConfig = serde_json::from_str(
            r#"{
                "key": "root", "name": "Root", "type": "group", "items": [
                    {"key": "empty", "name": "Empty", "type": "group", "items": []}
                ]
            }"#,
        )
        .expect("menu config");
        let mut menu = Menu::new(&config);
        let mut panel = panel::test::Panel::get("mock");
        let mut display = display::test::Display::get("mock");

        panel.push();
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");

        // The empty group still shows its Return entry.
        assert_eq!(display.row(1).expect("cursor row").name, "Return");

        panel.push();
        menu.update(&mut panel);
        menu.render(&mut display).expect("render");
        assert_eq!(display.row(1).expect("cursor row").name, "Empty");
    }
}
