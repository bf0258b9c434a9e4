//! Driver gamepads.

use bitflags::bitflags;
use trobotix_command::prelude::{EventLoop, Trigger, TriggerContext};

use super::SharedHub;

bitflags! {
    /// Digital buttons, one bit each.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u16 {
        const A = 1 << 0;
        const B = 1 << 1;
        const X = 1 << 2;
        const Y = 1 << 3;
        const LEFT_BUMPER = 1 << 4;
        const RIGHT_BUMPER = 1 << 5;
        const DPAD_UP = 1 << 6;
        const DPAD_DOWN = 1 << 7;
        const DPAD_LEFT = 1 << 8;
        const DPAD_RIGHT = 1 << 9;
        const BACK = 1 << 10;
        const START = 1 << 11;
        const LEFT_STICK = 1 << 12;
        const RIGHT_STICK = 1 << 13;
    }
}

/// Snapshot of one gamepad. Stick axes are in `[-1, 1]` with +y pointing
/// down, triggers in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GamepadState {
    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub right_y: f64,
    pub left_trigger: f64,
    pub right_trigger: f64,
    pub buttons: Buttons,
}

impl GamepadState {
    #[inline]
    pub fn pressed(&self, buttons: Buttons) -> bool {
        self.buttons.contains(buttons)
    }
}

/// Gamepad whose buttons bind commands through [`Trigger`]s.
#[derive(Clone)]
pub struct CommandGamepad {
    event_loop: EventLoop,
    hub: SharedHub,
    index: usize,
}

impl CommandGamepad {
    pub fn new(event_loop: &EventLoop, hub: SharedHub, index: usize) -> Self {
        Self {
            event_loop: event_loop.clone(),
            hub,
            index,
        }
    }

    pub fn state(&self) -> GamepadState {
        self.hub.borrow().gamepad(self.index)
    }

    /// Trigger that is true while every button in `buttons` is held.
    pub fn button(&self, buttons: Buttons) -> Trigger {
        let hub = self.hub.clone();
        let index = self.index;
        Trigger::new(
            &self.event_loop,
            move |_| hub.borrow().gamepad(index).pressed(buttons),
            TriggerContext::Always,
        )
    }

    pub fn a(&self) -> Trigger {
        self.button(Buttons::A)
    }

    pub fn b(&self) -> Trigger {
        self.button(Buttons::B)
    }

    pub fn x(&self) -> Trigger {
        self.button(Buttons::X)
    }

    pub fn y(&self) -> Trigger {
        self.button(Buttons::Y)
    }

    /// Trigger that is true while the left trigger exceeds `threshold`.
    pub fn left_trigger_above(&self, threshold: f64) -> Trigger {
        let hub = self.hub.clone();
        let index = self.index;
        Trigger::new(
            &self.event_loop,
            move |_| hub.borrow().gamepad(index).left_trigger > threshold,
            TriggerContext::Always,
        )
    }

    pub fn right_trigger_above(&self, threshold: f64) -> Trigger {
        let hub = self.hub.clone();
        let index = self.index;
        Trigger::new(
            &self.event_loop,
            move |_| hub.borrow().gamepad(index).right_trigger > threshold,
            TriggerContext::Always,
        )
    }

    pub fn left_x(&self) -> f64 {
        self.state().left_x
    }

    pub fn left_y(&self) -> f64 {
        self.state().left_y
    }

    pub fn right_x(&self) -> f64 {
        self.state().right_x
    }

    pub fn right_y(&self) -> f64 {
        self.state().right_y
    }
}
