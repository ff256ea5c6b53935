// ********* Input data structures ***********

/// One answer option of a question, as stored by the survey backend.
///
/// The rank and the score are expected to follow the invariant
/// `rank == 0 <=> score == 0`: an answer without a rank does not carry points.
/// The only exception is produced by the ranking itself, when there are more
/// correct answers than score tiers (see [`crate::rank_and_score_answers`]).
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct AnswerRecord {
    /// The content of the answer. May be empty.
    pub text: String,
    /// Correctness flag, assigned by an administrator.
    pub is_correct: bool,
    /// Number of respondents who gave this answer.
    pub response_count: u64,
    /// 0 means not ranked, 1 is the best rank.
    pub rank: u32,
    /// Points awarded for the rank, 0 when not ranked.
    pub score: u32,
    /// Stable handle from the storage layer, if any.
    pub identifier: Option<String>,
}

impl AnswerRecord {
    /// An unranked, incorrect answer given by `response_count` respondents.
    pub fn new(text: &str, response_count: u64) -> AnswerRecord {
        AnswerRecord {
            text: text.to_string(),
            response_count,
            ..Default::default()
        }
    }

    pub fn correct(text: &str, response_count: u64) -> AnswerRecord {
        AnswerRecord {
            is_correct: true,
            ..AnswerRecord::new(text, response_count)
        }
    }

    pub fn is_ranked(&self) -> bool {
        self.rank > 0
    }
}

/// A survey prompt with the answers collected for it.
///
/// Other metadata attached to a question (category, level, counters) belongs
/// to the storage layer and is not represented here.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct QuestionRecord {
    pub text: String,
    pub answers: Vec<AnswerRecord>,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ClusterResult {
    /// One consolidated answer per cluster, in the order of the cluster seeds.
    pub answers: Vec<AnswerRecord>,
    /// The number of input answers that were absorbed into another one.
    pub duplicates_merged: usize,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankingResult {
    pub answers: Vec<AnswerRecord>,
    /// The number of answers that received a positive rank.
    pub answers_ranked: usize,
    /// The number of answers that received a positive score.
    pub answers_scored: usize,
}

/// Statistics for one processed question
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionStats {
    pub question: QuestionRecord,
    pub duplicates_merged: usize,
    pub answers_ranked: usize,
    pub answers_scored: usize,
}

// ********* Configuration **********

/// The minimum similarity for two answers to be considered the same.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;

/// The points for the first ranks. Any further rank gets zero points.
pub const DEFAULT_SCORE_TIERS: [u32; 5] = [100, 80, 60, 40, 20];

#[derive(PartialEq, Debug, Clone)]
pub struct RankingRules {
    /// Expected to be within [0, 1]. Clamping is left to whoever reads the
    /// configuration.
    pub similarity_threshold: f64,
    pub score_tiers: Vec<u32>,
}

impl RankingRules {
    pub fn new(similarity_threshold: f64, score_tiers: &[u32]) -> RankingRules {
        RankingRules {
            similarity_threshold,
            score_tiers: score_tiers.to_vec(),
        }
    }
}

impl Default for RankingRules {
    fn default() -> Self {
        RankingRules::new(DEFAULT_SIMILARITY_THRESHOLD, &DEFAULT_SCORE_TIERS)
    }
}
