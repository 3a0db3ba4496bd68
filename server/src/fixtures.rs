use rand::{seq::SliceRandom, Rng};
use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{ActiveValue::NotSet, ConnectionTrait, DbErr, EntityTrait, QueryOrder, Set};

use crate::engine::{db_err, matches_exist, Error};
use tourney_db as db;
use tourney_db::common::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub order: i32,
    pub round: String,
    pub stage: Stage,
    pub team_a: Option<TeamRef>,
    pub team_b: Option<TeamRef>,
}

const PLACEHOLDERS: [(&str, Stage); 3] = [
    ("Semi-final 1", Stage::SemiFinal),
    ("Semi-final 2", Stage::SemiFinal),
    ("Final", Stage::Final),
];

/// Double round robin over a random permutation of `teams`: every pair meets
/// twice with home and away swapped, followed by empty elimination slots.
pub fn plan_fixtures<R: Rng + ?Sized>(
    mut teams: Vec<TeamRef>,
    rng: &mut R,
) -> Result<Vec<Fixture>, Error> {
    if teams.len() < 2 {
        return Err(Error::InvalidArgument(
            "At least 2 teams are required to generate fixtures.".to_owned(),
        ));
    }
    teams.shuffle(rng);
    let mut fixtures = Vec::with_capacity(teams.len() * (teams.len() - 1) + PLACEHOLDERS.len());
    let mut order = 0;
    let mut next_order = || {
        order += 1;
        order
    };
    for (i, home) in teams.iter().enumerate() {
        for away in teams[i + 1..].iter() {
            for (a, b) in [(home, away), (away, home)] {
                fixtures.push(Fixture {
                    order: next_order(),
                    round: "Group".to_owned(),
                    stage: Stage::Group,
                    team_a: Some(a.clone()),
                    team_b: Some(b.clone()),
                });
            }
        }
    }
    for (round, stage) in PLACEHOLDERS {
        fixtures.push(Fixture {
            order: next_order(),
            round: round.to_owned(),
            stage,
            team_a: None,
            team_b: None,
        });
    }
    Ok(fixtures)
}

/// One-shot: refuses to run once any match exists.
pub async fn generate_tournament<C: ConnectionTrait, R: Rng + ?Sized>(
    db: &C,
    rng: &mut R,
) -> Result<Vec<Fixture>, Error> {
    if matches_exist(db).await? {
        return Err(Error::Conflict(
            "Matches already exist. Reset all matches to re-randomise.".to_owned(),
        ));
    }
    let teams = db::teams::Entity::find()
        .order_by_asc(db::teams::Column::Id)
        .all(db)
        .await
        .map_err(db_err("Failed to fetch teams"))?
        .into_iter()
        .map(|t| TeamRef {
            id: t.id,
            name: t.name,
        })
        .collect();
    let fixtures = plan_fixtures(teams, rng)?;
    insert_fixtures(db, &fixtures).await?;
    log::info!("Generated {} fixtures", fixtures.len());
    Ok(fixtures)
}

fn missing_order_column(e: &DbErr) -> bool {
    let msg = e.to_string();
    // sqlite and postgres wordings.
    msg.contains("column named order") || msg.contains("column \"order\"")
}

async fn insert_fixtures<C: ConnectionTrait>(db: &C, fixtures: &[Fixture]) -> Result<(), Error> {
    let now = TimeDateTimeWithTimeZone::now_utc();
    let rows = |with_order: bool| {
        fixtures.iter().map(move |f| db::matches::ActiveModel {
            round: Set(f.round.clone()),
            stage: Set(f.stage),
            order: if with_order { Set(Some(f.order)) } else { NotSet },
            team_a_id: Set(f.team_a.as_ref().map(|t| t.id)),
            team_b_id: Set(f.team_b.as_ref().map(|t| t.id)),
            is_completed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    };
    match db::matches::Entity::insert_many(rows(true))
        .exec_without_returning(db)
        .await
    {
        Ok(_) => Ok(()),
        Err(e) if missing_order_column(&e) => {
            log::warn!("matches has no order column, inserting fixtures without it: {e}");
            db::matches::Entity::insert_many(rows(false))
                .exec_without_returning(db)
                .await
                .map_err(db_err("Failed to insert fixtures without order"))?;
            Ok(())
        }
        Err(e) => Err(db_err("Failed to insert fixtures")(e)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::test::{add_team, test_db};
    use rand::{rngs::StdRng, SeedableRng};
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter, QuerySelect};
    use std::collections::HashSet;

    fn teams(names: &[&str]) -> Vec<TeamRef> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| TeamRef {
                id: i as i64 + 1,
                name: n.to_string(),
            })
            .collect()
    }

    async fn count_matches<C: ConnectionTrait>(db: &C) -> u64 {
        db::matches::Entity::find()
            .select_only()
            .column(db::matches::Column::Id)
            .count(db)
            .await
            .expect("Failed to count matches")
    }

    #[test]
    fn test_three_teams() {
        let mut rng = StdRng::seed_from_u64(7);
        let fixtures = plan_fixtures(teams(&["A", "B", "C"]), &mut rng).unwrap();
        assert_eq!(fixtures.len(), 9);
        let orders: Vec<i32> = fixtures.iter().map(|f| f.order).collect();
        assert_eq!(orders, (1..=9).collect::<Vec<_>>());

        let group: Vec<&Fixture> = fixtures.iter().filter(|f| f.stage == Stage::Group).collect();
        assert_eq!(group.len(), 6);
        let pairs: HashSet<(i64, i64)> = group
            .iter()
            .map(|f| (f.team_a.as_ref().unwrap().id, f.team_b.as_ref().unwrap().id))
            .collect();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|(a, b)| a != b));
        assert!(group.iter().all(|f| f.round == "Group"));
        // Home and away legs are adjacent.
        for leg in group.chunks(2) {
            assert_eq!(leg[0].team_a, leg[1].team_b);
            assert_eq!(leg[0].team_b, leg[1].team_a);
        }

        let tail: Vec<(&str, Stage)> = fixtures[6..]
            .iter()
            .map(|f| (f.round.as_str(), f.stage))
            .collect();
        assert_eq!(tail, PLACEHOLDERS.to_vec());
        assert!(fixtures[6..]
            .iter()
            .all(|f| f.team_a.is_none() && f.team_b.is_none()));
    }

    #[test]
    fn test_too_few_teams() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            plan_fixtures(teams(&["A"]), &mut rng),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            plan_fixtures(vec![], &mut rng),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_once() {
        let db = test_db().await;
        for name in ["Rebels", "Empire", "Smugglers"] {
            add_team(&db, name).await;
        }
        let mut rng = StdRng::seed_from_u64(42);
        let fixtures = generate_tournament(&db, &mut rng).await.expect("Generation failed");
        assert_eq!(fixtures.len(), 9);
        assert_eq!(count_matches(&db).await, 9);
        let placeholders = db::matches::Entity::find()
            .filter(db::matches::Column::TeamAId.is_null())
            .count(&db)
            .await
            .unwrap();
        assert_eq!(placeholders, 3);

        let again = generate_tournament(&db, &mut rng).await;
        assert!(matches!(again, Err(Error::Conflict(_))), "{again:?}");
        assert_eq!(count_matches(&db).await, 9);
    }

    #[tokio::test]
    async fn test_generate_needs_two_teams() {
        let db = test_db().await;
        add_team(&db, "Loners").await;
        let mut rng = StdRng::seed_from_u64(42);
        let res = generate_tournament(&db, &mut rng).await;
        assert!(matches!(res, Err(Error::InvalidArgument(_))), "{res:?}");
        assert_eq!(count_matches(&db).await, 0);
    }

    #[tokio::test]
    async fn test_schema_without_order_column() {
        let db = test_db().await;
        add_team(&db, "Rebels").await;
        add_team(&db, "Empire").await;
        db.execute_unprepared("ALTER TABLE matches DROP COLUMN \"order\"")
            .await
            .expect("Failed to drop order column");
        let mut rng = StdRng::seed_from_u64(3);
        let fixtures = generate_tournament(&db, &mut rng).await.expect("Generation failed");
        assert_eq!(fixtures.len(), 5);
        assert_eq!(count_matches(&db).await, 5);
    }
}
