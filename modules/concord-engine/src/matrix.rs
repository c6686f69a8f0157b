//! Dense voter × comment matrix for one discussion.

use std::collections::HashMap;

use uuid::Uuid;

use concord_common::{Comment, ConcordError};

/// Rows are distinct voters in order of first appearance, columns are the
/// discussion's comments in fetch order. A cell holds the vote value, or 0
/// when the voter never voted on that comment.
#[derive(Debug, Clone)]
pub struct VoteMatrix {
    cells: Vec<Vec<f64>>,
    voters: Vec<Uuid>,
    comments: Vec<Uuid>,
    voter_rows: HashMap<Uuid, usize>,
    comment_columns: HashMap<Uuid, usize>,
}

impl VoteMatrix {
    /// Build the matrix from comments with their nested votes.
    ///
    /// A vote is placed in the column of the comment it is nested under.
    /// Fails on a vote value outside {-1, +1} or a repeated comment id.
    pub fn build(comments: &[Comment]) -> Result<Self, ConcordError> {
        let mut comment_columns = HashMap::with_capacity(comments.len());
        for (col, comment) in comments.iter().enumerate() {
            if comment_columns.insert(comment.id, col).is_some() {
                return Err(ConcordError::Validation(format!(
                    "comment {} appears more than once",
                    comment.id
                )));
            }
        }

        let mut voters = Vec::new();
        let mut voter_rows: HashMap<Uuid, usize> = HashMap::new();
        for vote in comments.iter().flat_map(|c| c.votes.iter()) {
            if !vote.is_valid() {
                return Err(ConcordError::Validation(format!(
                    "vote by {} on comment {} has value {}, expected -1 or 1",
                    vote.user_id, vote.comment_id, vote.value
                )));
            }
            voter_rows.entry(vote.user_id).or_insert_with(|| {
                voters.push(vote.user_id);
                voters.len() - 1
            });
        }

        let mut cells = vec![vec![0.0; comments.len()]; voters.len()];
        for (col, comment) in comments.iter().enumerate() {
            for vote in &comment.votes {
                let row = voter_rows[&vote.user_id];
                cells[row][col] = f64::from(vote.value);
            }
        }

        Ok(Self {
            cells,
            voters,
            comments: comments.iter().map(|c| c.id).collect(),
            voter_rows,
            comment_columns,
        })
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row][col]
    }

    pub fn voters(&self) -> &[Uuid] {
        &self.voters
    }

    pub fn comments(&self) -> &[Uuid] {
        &self.comments
    }

    pub fn voter_row(&self, user_id: &Uuid) -> Option<usize> {
        self.voter_rows.get(user_id).copied()
    }

    pub fn comment_column(&self, comment_id: &Uuid) -> Option<usize> {
        self.comment_columns.get(comment_id).copied()
    }

    /// Build directly from cell values, with fresh ids for rows and columns.
    #[cfg(any(test, feature = "test-support"))]
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let voters: Vec<Uuid> = (0..rows.len()).map(|_| Uuid::new_v4()).collect();
        let comments: Vec<Uuid> = (0..width).map(|_| Uuid::new_v4()).collect();
        Self {
            voter_rows: voters.iter().enumerate().map(|(i, id)| (*id, i)).collect(),
            comment_columns: comments.iter().enumerate().map(|(i, id)| (*id, i)).collect(),
            cells: rows,
            voters,
            comments,
        }
    }
}
