use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::read_model::{MatchSummary, PlayerSummary, TeamSummary};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Slot<T> {
    value: Arc<T>,
    stored_at: Instant,
}

#[derive(Default)]
struct Slots {
    teams: Option<Slot<Vec<TeamSummary>>>,
    players: Option<Slot<Vec<PlayerSummary>>>,
    matches: Option<Slot<Vec<MatchSummary>>>,
}

/// Read-side cache for the public pages and admin listings. Entries expire
/// after `ttl` and are dropped wholesale by `invalidate`. Writers never read
/// through it.
pub struct DataCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<Slots>,
}

impl DataCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn teams(&self) -> Option<Arc<Vec<TeamSummary>>> {
        self.fresh(&self.lock().teams)
    }

    pub fn put_teams(&self, teams: Arc<Vec<TeamSummary>>) {
        self.lock().teams = Some(self.slot(teams));
    }

    pub fn players(&self) -> Option<Arc<Vec<PlayerSummary>>> {
        self.fresh(&self.lock().players)
    }

    pub fn put_players(&self, players: Arc<Vec<PlayerSummary>>) {
        self.lock().players = Some(self.slot(players));
    }

    pub fn matches(&self) -> Option<Arc<Vec<MatchSummary>>> {
        self.fresh(&self.lock().matches)
    }

    pub fn put_matches(&self, matches: Arc<Vec<MatchSummary>>) {
        self.lock().matches = Some(self.slot(matches));
    }

    pub fn invalidate(&self) {
        log::info!("Resetting data cache.");
        *self.lock() = Slots::default();
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // Slots hold plain data, a panic while holding the lock cannot leave
        // them half-written.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn slot<T>(&self, value: Arc<T>) -> Slot<T> {
        Slot {
            value,
            stored_at: self.clock.now(),
        }
    }

    fn fresh<T>(&self, slot: &Option<Slot<T>>) -> Option<Arc<T>> {
        let slot = slot.as_ref()?;
        if self.clock.now().saturating_duration_since(slot.stored_at) < self.ttl {
            Some(slot.value.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    pub struct ManualClock(Mutex<Instant>);

    impl ManualClock {
        pub fn new() -> Self {
            Self(Mutex::new(Instant::now()))
        }

        pub fn advance(&self, d: Duration) {
            *self.0.lock().unwrap() += d;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.0.lock().unwrap()
        }
    }

    fn team(id: i64, name: &str) -> TeamSummary {
        TeamSummary {
            id,
            name: name.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = DataCache::new(Duration::from_secs(60), clock.clone());
        assert!(cache.teams().is_none());
        cache.put_teams(Arc::new(vec![team(1, "Rebels")]));
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.teams().expect("Expected cached teams")[0].name, "Rebels");
        clock.advance(Duration::from_secs(1));
        assert!(cache.teams().is_none());
    }

    #[test]
    fn test_slots_are_independent() {
        let clock = Arc::new(ManualClock::new());
        let cache = DataCache::new(Duration::from_secs(60), clock.clone());
        cache.put_teams(Arc::new(vec![team(1, "Rebels")]));
        clock.advance(Duration::from_secs(30));
        cache.put_players(Arc::new(vec![]));
        clock.advance(Duration::from_secs(40));
        assert!(cache.teams().is_none());
        assert!(cache.players().is_some());
        assert!(cache.matches().is_none());
    }

    #[test]
    fn test_invalidate_drops_everything() {
        let cache = DataCache::new(Duration::from_secs(60), Arc::new(ManualClock::new()));
        cache.put_teams(Arc::new(vec![team(1, "Rebels")]));
        cache.put_players(Arc::new(vec![]));
        cache.put_matches(Arc::new(vec![]));
        cache.invalidate();
        assert!(cache.teams().is_none());
        assert!(cache.players().is_none());
        assert!(cache.matches().is_none());
    }
}
