use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};
use super::types::Modifiers;

/// Current input state for a single window.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,

    pub focused: bool,

    /// Pointer position in physical pixels, while over the window.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies an event. Returns `true` for a fresh key press, the edge a
    /// binding should fire on.
    pub fn apply_event(&mut self, ev: &InputEvent) -> bool {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Avoid stuck keys when focus changes mid-press.
                    self.keys_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => self.pointer_pos = Some((*x, *y)),

            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key {
                key,
                state,
                modifiers,
                repeat,
            } => {
                self.modifiers = *modifiers;
                return match state {
                    KeyState::Pressed => self.keys_down.insert(*key) && !repeat,
                    KeyState::Released => {
                        self.keys_down.remove(key);
                        false
                    }
                };
            }
        }
        false
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            modifiers: Modifiers::default(),
            repeat,
        }
    }

    #[test]
    fn press_edges_fire_once() {
        let mut state = InputState::default();
        assert!(state.apply_event(&key(Key::Space, KeyState::Pressed, false)));
        assert!(!state.apply_event(&key(Key::Space, KeyState::Pressed, true)));
        assert!(state.key_down(Key::Space));

        assert!(!state.apply_event(&key(Key::Space, KeyState::Released, false)));
        assert!(!state.key_down(Key::Space));
        assert!(state.apply_event(&key(Key::Space, KeyState::Pressed, false)));
    }

    #[test]
    fn focus_loss_releases_keys() {
        let mut state = InputState::default();
        state.apply_event(&key(Key::Digit1, KeyState::Pressed, false));
        state.apply_event(&InputEvent::Focused(false));
        assert!(state.keys_down.is_empty());
    }

    #[test]
    fn pointer_tracks_until_it_leaves() {
        let mut state = InputState::default();
        state.apply_event(&InputEvent::PointerMoved { x: 3.0, y: 4.0 });
        assert_eq!(state.pointer_pos, Some((3.0, 4.0)));
        state.apply_event(&InputEvent::PointerLeft);
        assert_eq!(state.pointer_pos, None);
    }
}
