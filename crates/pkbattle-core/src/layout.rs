//! Bubble placement on the stage.
//!
//! [`StageLayout`] turns a zone hint (and optionally a team) into a random
//! pixel position inside that zone. Horizontal strips draw x across the
//! strip and y near its edge; the side zones draw y down the edge. A team
//! narrows x to that team's band, which is how gift bubbles end up on the
//! sender's side.

use pkbattle_types::{Position, Team, ZoneAffinity};
use rand::Rng;

use crate::config::{Band, StageConfig, ZoneRect};

/// Stage geometry used to place bubbles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLayout {
    stage: StageConfig,
}

impl StageLayout {
    /// Build a layout from the stage configuration.
    pub const fn new(stage: StageConfig) -> Self {
        Self { stage }
    }

    /// Pick a position for a bubble.
    ///
    /// `team_a` / `team_b` zones use the bottom strip with that team's
    /// band. An explicit `team` narrows x for the horizontal strips and the
    /// free zone; it is ignored for the side zones.
    pub fn allocate<R: Rng + ?Sized>(
        &self,
        zone: ZoneAffinity,
        team: Option<Team>,
        rng: &mut R,
    ) -> Position {
        let team = zone.implied_team().or(team);
        let rect = self.rect_for(zone);
        let (x_min, x_max) = match (zone, team) {
            (ZoneAffinity::Left | ZoneAffinity::Right, _) | (_, None) => (rect.x_min, rect.x_max),
            (_, Some(team)) => {
                let band = self.band_for(team);
                (band.min, band.max)
            }
        };
        Position::new(
            pick(rng, x_min, x_max),
            pick(rng, rect.y_min, rect.y_max),
        )
    }

    /// The rectangle a zone draws from.
    pub const fn rect_for(&self, zone: ZoneAffinity) -> ZoneRect {
        match zone {
            ZoneAffinity::Top => self.stage.top,
            ZoneAffinity::Bottom | ZoneAffinity::TeamA | ZoneAffinity::TeamB => self.stage.bottom,
            ZoneAffinity::Left => self.stage.left,
            ZoneAffinity::Right => self.stage.right,
            ZoneAffinity::Free => self.stage.free,
        }
    }

    /// The horizontal band for a team.
    pub const fn band_for(&self, team: Team) -> Band {
        match team {
            Team::A => self.stage.team_a_band,
            Team::B => self.stage.team_b_band,
        }
    }
}

/// Uniform pick from an inclusive range. An inverted range is swapped
/// rather than rejected.
fn pick<R: Rng + ?Sized>(rng: &mut R, a: i32, b: i32) -> i32 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    rng.random_range(low..=high)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn layout() -> StageLayout {
        StageLayout::new(StageConfig::default())
    }

    fn inside(rect: ZoneRect, position: Position) -> bool {
        (rect.x_min..=rect.x_max).contains(&position.x)
            && (rect.y_min..=rect.y_max).contains(&position.y)
    }

    #[test]
    fn every_zone_stays_inside_its_rect() {
        let layout = layout();
        let mut rng = StdRng::seed_from_u64(42);
        for zone in [
            ZoneAffinity::Top,
            ZoneAffinity::Bottom,
            ZoneAffinity::Left,
            ZoneAffinity::Right,
            ZoneAffinity::Free,
        ] {
            for _ in 0..200 {
                let position = layout.allocate(zone, None, &mut rng);
                assert!(inside(layout.rect_for(zone), position), "{zone:?} {position:?}");
            }
        }
    }

    #[test]
    fn team_zones_use_team_band_on_bottom_strip() {
        let layout = layout();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = layout.allocate(ZoneAffinity::TeamA, None, &mut rng);
            assert!((50..=600).contains(&a.x));
            assert!((820..=950).contains(&a.y));

            let b = layout.allocate(ZoneAffinity::TeamB, None, &mut rng);
            assert!((900..=1400).contains(&b.x));
        }
    }

    #[test]
    fn explicit_team_narrows_top_strip() {
        let layout = layout();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let position = layout.allocate(ZoneAffinity::Top, Some(Team::B), &mut rng);
            assert!((900..=1400).contains(&position.x));
            assert!((20..=150).contains(&position.y));
        }
    }

    #[test]
    fn side_zones_ignore_team() {
        let layout = layout();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let position = layout.allocate(ZoneAffinity::Left, Some(Team::B), &mut rng);
            assert!((10..=100).contains(&position.x));
        }
    }

    #[test]
    fn same_seed_same_positions() {
        let layout = layout();
        let mut first = StdRng::seed_from_u64(99);
        let mut second = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(
                layout.allocate(ZoneAffinity::Free, None, &mut first),
                layout.allocate(ZoneAffinity::Free, None, &mut second)
            );
        }
    }

    #[test]
    fn inverted_range_is_swapped() {
        let mut stage = StageConfig::default();
        stage.top = ZoneRect::new(200, 100, 30, 30);
        let layout = StageLayout::new(stage);
        let mut rng = StdRng::seed_from_u64(1);
        let position = layout.allocate(ZoneAffinity::Top, None, &mut rng);
        assert!((100..=200).contains(&position.x));
        assert_eq!(position.y, 30);
    }
}
