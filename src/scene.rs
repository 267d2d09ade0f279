use crate::errors::InteractionError;

/// Linear presentation position, 1-based and saturating at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSelector {
    current: u8,
    max: u8,
    allows_jump: bool,
}

impl SceneSelector {
    pub fn new(max: u8, allows_jump: bool) -> Self {
        Self {
            current: 1,
            max: max.max(1),
            allows_jump,
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn is_terminal(&self) -> bool {
        self.current == self.max
    }

    /// Moves one scene forward. Returns false when already at the last scene.
    pub fn advance(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn go_to(&mut self, scene: u32) -> Result<bool, InteractionError> {
        if !self.allows_jump {
            return Err(InteractionError::JumpUnsupported);
        }
        let scene = match u8::try_from(scene) {
            Ok(scene) if (1..=self.max).contains(&scene) => scene,
            _ => {
                return Err(InteractionError::SceneOutOfRange {
                    scene,
                    max: self.max,
                })
            }
        };
        let changed = self.current != scene;
        self.current = scene;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_at_first_scene() {
        let selector = SceneSelector::new(3, false);
        assert_eq!(selector.current(), 1);
        assert!(!selector.is_terminal());
    }

    #[test]
    fn advance_is_noop_at_terminal() {
        let mut selector = SceneSelector::new(2, false);
        assert!(selector.advance());
        assert!(!selector.advance());
        assert_eq!(selector.current(), 2);
    }

    #[test]
    fn jump_requires_support_and_range() {
        let mut sequential = SceneSelector::new(3, false);
        assert_eq!(sequential.go_to(2), Err(InteractionError::JumpUnsupported));

        let mut selector = SceneSelector::new(4, true);
        assert_eq!(selector.go_to(4), Ok(true));
        assert_eq!(selector.go_to(4), Ok(false));
        assert_eq!(selector.go_to(1), Ok(true));
        assert_eq!(
            selector.go_to(5),
            Err(InteractionError::SceneOutOfRange { scene: 5, max: 4 })
        );
        assert_eq!(
            selector.go_to(300),
            Err(InteractionError::SceneOutOfRange { scene: 300, max: 4 })
        );
        assert_eq!(selector.current(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_advance_saturates_at_max(max in 1u8..=5, extra in 0usize..10) {
            let mut selector = SceneSelector::new(max, false);
            for _ in 0..(max as usize + extra) {
                selector.advance();
                prop_assert!(selector.current() <= max);
            }
            prop_assert_eq!(selector.current(), max);
        }
    }
}
