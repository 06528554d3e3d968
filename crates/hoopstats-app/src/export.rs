// CSV export of per-game trend series.

use std::io;

use serde::Serialize;

use hoopstats_core::analytics::trends::{PlayerTrends, TeamTrends};

#[derive(Debug, Serialize)]
struct TeamTrendRow<'a> {
    game_id: u32,
    date: &'a str,
    opponent: &'a str,
    result: &'static str,
    vc_score: u32,
    opp_score: u32,
    fg_pct: f64,
    fg3_pct: f64,
    asst: u32,
    to: u32,
    reb: u32,
    oreb: u32,
    dreb: u32,
    stl: u32,
    blk: u32,
    ft: u32,
    fta: u32,
}

#[derive(Debug, Serialize)]
struct PlayerTrendRow<'a> {
    player: &'a str,
    game_id: u32,
    date: &'a str,
    opponent: &'a str,
    pts: u32,
    fg: u32,
    fg_att: u32,
    fg3: u32,
    asst: u32,
    reb: u32,
    stl: u32,
    plus_minus: i32,
    to: u32,
    fouls: u32,
}

/// Write one row per game with a header line. Returns the row count.
pub fn write_team_trends<W: io::Write>(trends: &TeamTrends, out: W) -> Result<usize, csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for i in 0..trends.len() {
        writer.serialize(TeamTrendRow {
            game_id: trends.games[i],
            date: &trends.dates[i],
            opponent: &trends.opponents[i],
            result: trends.results[i].letter(),
            vc_score: trends.vc_score[i],
            opp_score: trends.opp_score[i],
            fg_pct: trends.fg_pct[i],
            fg3_pct: trends.fg3_pct[i],
            asst: trends.asst[i],
            to: trends.to[i],
            reb: trends.reb[i],
            oreb: trends.oreb[i],
            dreb: trends.dreb[i],
            stl: trends.stl[i],
            blk: trends.blk[i],
            ft: trends.ft[i],
            fta: trends.fta[i],
        })?;
    }
    writer.flush()?;
    Ok(trends.len())
}

pub fn write_player_trends<W: io::Write>(trends: &PlayerTrends, out: W) -> Result<usize, csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for i in 0..trends.games.len() {
        writer.serialize(PlayerTrendRow {
            player: &trends.name,
            game_id: trends.games[i],
            date: &trends.dates[i],
            opponent: &trends.opponents[i],
            pts: trends.pts[i],
            fg: trends.fg[i],
            fg_att: trends.fg_att[i],
            fg3: trends.fg3[i],
            asst: trends.asst[i],
            reb: trends.reb[i],
            stl: trends.stl[i],
            plus_minus: trends.plus_minus[i],
            to: trends.to[i],
            fouls: trends.fouls[i],
        })?;
    }
    writer.flush()?;
    Ok(trends.games.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoopstats_core::model::GameResult;

    fn team() -> TeamTrends {
        TeamTrends {
            games: vec![1, 2],
            opponents: vec!["Ridgeview".into(), "Lakeside, North".into()],
            dates: vec!["2024-12-03".into(), "2024-12-07".into()],
            results: vec![GameResult::Win, GameResult::Loss],
            vc_score: vec![48, 40],
            opp_score: vec![40, 52],
            fg_pct: vec![45.5, 38.0],
            fg3_pct: vec![33.3, 25.0],
            asst: vec![12, 8],
            to: vec![9, 15],
            reb: vec![30, 25],
            oreb: vec![8, 6],
            dreb: vec![22, 19],
            stl: vec![7, 4],
            blk: vec![2, 1],
            ft: vec![8, 6],
            fta: vec![11, 10],
        }
    }

    #[test]
    fn team_rows_with_header() {
        let mut buf = Vec::new();
        let rows = write_team_trends(&team(), &mut buf).unwrap();
        assert_eq!(rows, 2);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("game_id,date,opponent,result,vc_score,opp_score,fg_pct"));
        assert!(lines[1].starts_with("1,2024-12-03,Ridgeview,W,48,40,45.5,33.3,12,9,"));
        // Commas inside a field get quoted.
        assert!(lines[2].starts_with("2,2024-12-07,\"Lakeside, North\",L,40,52,"));
    }

    #[test]
    fn player_rows_carry_name() {
        let trends = PlayerTrends {
            name: "J Carter".into(),
            games: vec![3],
            opponents: vec!["Hillcrest".into()],
            dates: vec!["2024-12-10".into()],
            pts: vec![21],
            fg: vec![8],
            fg_att: vec![15],
            fg3: vec![2],
            asst: vec![4],
            reb: vec![6],
            stl: vec![2],
            plus_minus: vec![-3],
            to: vec![3],
            fouls: vec![2],
        };
        let mut buf = Vec::new();
        assert_eq!(write_player_trends(&trends, &mut buf).unwrap(), 1);
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("J Carter,3,2024-12-10,Hillcrest,21,8,15,2,4,6,2,-3,3,2")
        );
    }

    #[test]
    fn empty_series_writes_nothing() {
        let mut buf = Vec::new();
        assert_eq!(write_team_trends(&TeamTrends::default(), &mut buf).unwrap(), 0);
        assert!(buf.is_empty());
    }
}
