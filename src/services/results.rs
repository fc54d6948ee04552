use std::collections::BTreeMap;

use crate::db::{LeaderboardEntry, UserMarks};
use crate::names;
use crate::utils::non_blank;

#[derive(Default)]
struct Row {
    quiz_marks: i64,
    case_marks: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    school_name: Option<String>,
}

impl Row {
    fn absorb(&mut self, marks: UserMarks) {
        self.first_name = self.first_name.take().or(marks.first_name);
        self.last_name = self.last_name.take().or(marks.last_name);
        self.email = self.email.take().or(marks.email);
        self.school_name = non_blank(self.school_name.as_deref())
            .or_else(|| non_blank(marks.school_name.as_deref()));
    }
}

/// Joins per-user quiz and case totals into one ranking. Users present in
/// either list appear, the missing side counts as zero. Ties keep user id order.
pub fn merge_leaderboard(quiz: Vec<UserMarks>, case: Vec<UserMarks>) -> Vec<LeaderboardEntry> {
    let mut rows: BTreeMap<i64, Row> = BTreeMap::new();

    for marks in quiz {
        let row = rows.entry(marks.user_id).or_default();
        row.quiz_marks += marks.marks;
        row.absorb(marks);
    }
    for marks in case {
        let row = rows.entry(marks.user_id).or_default();
        row.case_marks += marks.marks;
        row.absorb(marks);
    }

    let mut entries: Vec<LeaderboardEntry> = rows
        .into_iter()
        .map(|(user_id, row)| LeaderboardEntry {
            user_id,
            user_name: match (row.first_name, row.last_name) {
                (Some(first), Some(last)) => format!("{first} {last}"),
                _ => names::DELETED_USER.to_string(),
            },
            email: row.email.unwrap_or_else(|| names::UNKNOWN_EMAIL.to_string()),
            school_name: row
                .school_name
                .unwrap_or_else(|| names::UNKNOWN_SCHOOL.to_string()),
            quiz_marks: row.quiz_marks,
            case_marks: row.case_marks,
            total_marks: row.quiz_marks + row.case_marks,
        })
        .collect();

    entries.sort_by(|a, b| b.total_marks.cmp(&a.total_marks));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(user_id: i64, marks: i64) -> UserMarks {
        UserMarks {
            user_id,
            marks,
            first_name: Some(format!("First{user_id}")),
            last_name: Some("Last".to_string()),
            email: Some(format!("u{user_id}@x.com")),
            school_name: Some("Lincoln High".to_string()),
        }
    }

    #[test]
    fn quiz_only_user_gets_zero_case_marks() {
        let board = merge_leaderboard(vec![marks(1, 9)], Vec::new());
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].quiz_marks, 9);
        assert_eq!(board[0].case_marks, 0);
        assert_eq!(board[0].total_marks, 9);
        assert_eq!(board[0].user_name, "First1 Last");
    }

    #[test]
    fn unions_both_sides_and_sorts_by_total() {
        let board = merge_leaderboard(
            vec![marks(1, 5), marks(2, 12)],
            vec![marks(1, 8), marks(3, 14)],
        );

        let order: Vec<(i64, i64)> = board.iter().map(|e| (e.user_id, e.total_marks)).collect();
        assert_eq!(order, vec![(3, 14), (1, 13), (2, 12)]);
        assert!(board
            .iter()
            .all(|e| e.total_marks == e.quiz_marks + e.case_marks));
    }

    #[test]
    fn ties_keep_user_order() {
        let board = merge_leaderboard(vec![marks(4, 7), marks(2, 7)], Vec::new());
        let ids: Vec<i64> = board.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn deleted_owner_gets_placeholders() {
        let orphan = UserMarks {
            user_id: 9,
            marks: 3,
            first_name: None,
            last_name: None,
            email: None,
            school_name: None,
        };
        let board = merge_leaderboard(Vec::new(), vec![orphan]);
        assert_eq!(board[0].user_name, "Deleted User");
        assert_eq!(board[0].email, "N/A");
        assert_eq!(board[0].school_name, "N/A");
    }
}
