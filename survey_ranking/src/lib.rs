/*!

Consolidation and ranking of free-text survey answers.

The answers collected for a question are processed in two stages:
- **clustering**: answers that only differ by case, surrounding whitespace or a few
  typos are merged into a single answer, and their response counts are added up.
- **ranking**: the correct answers are ranked by popularity and receive points from
  a fixed table of score tiers. Incorrect answers are never ranked.

```
use survey_ranking::*;

let question = QuestionRecord {
    text: "Name a common Sanskrit greeting.".to_string(),
    answers: vec![
        AnswerRecord::new("Namaste", 3),
        AnswerRecord::correct("namaste", 5),
        AnswerRecord::new("Pranaam", 2),
    ],
};
let processed = process_question(&question, &RankingRules::default());
assert_eq!(processed.answers[0].text, "namaste");
assert_eq!(processed.answers[0].response_count, 8);
assert_eq!(processed.answers[0].score, 100);
```

See the [manual] for the details of the algorithms and of the command line interface.
*/

pub mod builder;
mod config;
pub mod manual;
pub mod similarity;

use log::{debug, info};

use std::cmp::Reverse;

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct ResponseCount(u64);

impl std::iter::Sum for ResponseCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        ResponseCount(iter.fold(0, |acc, rc| acc.saturating_add(rc.0)))
    }
}

// A position in the input list of answers.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct AnswerId(usize);

// Invariant: members are in input order and the seed is the first member.
#[derive(Eq, PartialEq, Debug, Clone)]
struct Cluster {
    seed: AnswerId,
    members: Vec<AnswerId>,
}

/// Merges the answers that are similar enough into clusters.
///
/// Arguments:
/// * `answers` the answers of a single question, in the order they were collected
/// * `threshold` the minimum similarity (see [similarity::similarity]) for two answers
/// to be merged. Two answers exactly at the threshold are merged.
///
/// The clustering is greedy: the first answer not yet assigned becomes the seed of a new
/// cluster, and all the later unassigned answers that are similar to the seed (and not
/// to the other members) join it. The result therefore depends on the order of the input.
///
/// Each cluster produces one answer:
/// * the response count is the sum of the counts of all the members
/// * it is correct if any member is correct
/// * the text and the identifier come from the seed, unless a later member is correct
/// while the seed is not (the first such member wins), or no member is correct and a
/// later member was given by strictly more respondents than the seed (the last such
/// member wins)
/// * the rank and the score are the best ones found among the members.
pub fn cluster_answers(answers: &[AnswerRecord], threshold: f64) -> Vec<AnswerRecord> {
    cluster_answers_stats(answers, threshold).answers
}

/// Same as [cluster_answers], also reporting how many answers were merged away.
pub fn cluster_answers_stats(answers: &[AnswerRecord], threshold: f64) -> ClusterResult {
    debug!(
        "cluster_answers: {:?} answers, threshold: {:?}",
        answers.len(),
        threshold
    );
    let clusters = find_clusters(answers, threshold);
    let duplicates_merged = answers.len() - clusters.len();
    let merged: Vec<AnswerRecord> = clusters
        .iter()
        .map(|c| consolidate_cluster(answers, c))
        .collect();

    let input_total: ResponseCount = answers.iter().map(response_count).sum();
    let output_total: ResponseCount = merged.iter().map(response_count).sum();
    debug_assert_eq!(
        input_total, output_total,
        "Clustering changed the number of responses"
    );

    ClusterResult {
        answers: merged,
        duplicates_merged,
    }
}

/// Ranks and scores the correct answers by popularity.
///
/// Arguments:
/// * `answers` the (usually already clustered) answers of a question
/// * `score_tiers` the points for each rank, starting with rank 1
///
/// The correct answers are sorted by decreasing response count. Answers with the same
/// count keep their relative input order, so the first one in the input wins the better
/// rank. The i-th correct answer (starting at 0) gets the rank `i + 1` and the score
/// `score_tiers[i]`, or 0 past the end of the table. Ranks keep increasing past the end
/// of the table.
///
/// The incorrect answers get a rank and a score of 0, whatever their popularity.
///
/// The output contains the ranked answers first, in rank order, followed by the
/// incorrect answers in their input order.
pub fn rank_and_score_answers(answers: &[AnswerRecord], score_tiers: &[u32]) -> Vec<AnswerRecord> {
    rank_and_score_answers_stats(answers, score_tiers).answers
}

/// Same as [rank_and_score_answers], also reporting how many answers were ranked and scored.
pub fn rank_and_score_answers_stats(answers: &[AnswerRecord], score_tiers: &[u32]) -> RankingResult {
    let (mut correct, incorrect): (Vec<AnswerRecord>, Vec<AnswerRecord>) =
        answers.iter().cloned().partition(|a| a.is_correct);
    debug!(
        "rank_and_score_answers: {:?} correct, {:?} incorrect, score tiers: {:?}",
        correct.len(),
        incorrect.len(),
        score_tiers
    );

    // The sort is stable: ties are resolved by input order.
    correct.sort_by_key(|a| Reverse(response_count(a)));

    let mut answers_scored = 0;
    for (idx, a) in correct.iter_mut().enumerate() {
        a.rank = (idx + 1) as u32;
        a.score = score_tiers.get(idx).cloned().unwrap_or(0);
        if a.score > 0 {
            answers_scored += 1;
        }
        debug!(
            "rank_and_score_answers: {:?} ({:?} responses) -> rank {:?}, score {:?}",
            a.text, a.response_count, a.rank, a.score
        );
    }
    let answers_ranked = correct.len();

    let mut res = correct;
    res.extend(incorrect.into_iter().map(|a| AnswerRecord {
        rank: 0,
        score: 0,
        ..a
    }));

    RankingResult {
        answers: res,
        answers_ranked,
        answers_scored,
    }
}

/// Clusters then ranks the answers of a question.
///
/// A question without answers is returned unchanged.
pub fn process_question(question: &QuestionRecord, rules: &RankingRules) -> QuestionRecord {
    process_question_stats(question, rules).question
}

/// Same as [process_question], with statistics about the processing.
pub fn process_question_stats(question: &QuestionRecord, rules: &RankingRules) -> QuestionStats {
    if question.answers.is_empty() {
        debug!("process_question: no answers for {:?}", question.text);
        return QuestionStats {
            question: question.clone(),
            duplicates_merged: 0,
            answers_ranked: 0,
            answers_scored: 0,
        };
    }

    let clustered = cluster_answers_stats(&question.answers, rules.similarity_threshold);
    let ranked = rank_and_score_answers_stats(&clustered.answers, &rules.score_tiers);
    info!(
        "Question {:?}: {} answers -> {} clusters, {} ranked, {} scored",
        question.text,
        question.answers.len(),
        clustered.answers.len(),
        ranked.answers_ranked,
        ranked.answers_scored
    );

    QuestionStats {
        question: QuestionRecord {
            text: question.text.clone(),
            answers: ranked.answers,
        },
        duplicates_merged: clustered.duplicates_merged,
        answers_ranked: ranked.answers_ranked,
        answers_scored: ranked.answers_scored,
    }
}

fn response_count(a: &AnswerRecord) -> ResponseCount {
    ResponseCount(a.response_count)
}

// Single-linkage against the seed only, in input order.
fn find_clusters(answers: &[AnswerRecord], threshold: f64) -> Vec<Cluster> {
    let keys: Vec<String> = answers.iter().map(|a| similarity::normalize(&a.text)).collect();
    let mut assigned = vec![false; answers.len()];
    let mut clusters: Vec<Cluster> = Vec::new();

    for i in 0..answers.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut members = vec![AnswerId(i)];
        for j in (i + 1)..answers.len() {
            if assigned[j] {
                continue;
            }
            let sim = similarity::similarity(&keys[i], &keys[j]);
            if sim >= threshold {
                debug!(
                    "find_clusters: merging {:?} into {:?} (similarity {:.3})",
                    answers[j].text, answers[i].text, sim
                );
                assigned[j] = true;
                members.push(AnswerId(j));
            }
        }
        clusters.push(Cluster {
            seed: AnswerId(i),
            members,
        });
    }
    clusters
}

fn consolidate_cluster(answers: &[AnswerRecord], cluster: &Cluster) -> AnswerRecord {
    let seed = &answers[cluster.seed.0];

    let total: ResponseCount = cluster
        .members
        .iter()
        .map(|aid| response_count(&answers[aid.0]))
        .sum();

    // The member providing the text. The identifier follows it, but an earlier
    // identifier is kept if the new canonical member has none.
    let mut canonical: &AnswerRecord = seed;
    let mut identifier: Option<String> = seed.identifier.clone();
    let mut is_correct = seed.is_correct;

    for aid in cluster.members.iter().skip(1) {
        let member = &answers[aid.0];
        let supersedes = if is_correct {
            // A correct seed, or the first correct member, is final.
            false
        } else if member.is_correct {
            true
        } else {
            member.response_count > seed.response_count
        };
        if supersedes {
            debug!(
                "consolidate_cluster: {:?} supersedes {:?}",
                member.text, canonical.text
            );
            canonical = member;
            if member.identifier.is_some() {
                identifier = member.identifier.clone();
            }
        }
        is_correct |= member.is_correct;
    }

    let (rank, score) = best_rank(answers, cluster);

    AnswerRecord {
        text: canonical.text.clone(),
        is_correct,
        response_count: total.0,
        rank,
        score,
        identifier,
    }
}

// The lowest positive rank among the members, the higher score breaking ties.
fn best_rank(answers: &[AnswerRecord], cluster: &Cluster) -> (u32, u32) {
    cluster
        .members
        .iter()
        .map(|aid| &answers[aid.0])
        .filter(|a| a.is_ranked())
        .map(|a| (a.rank, a.score))
        .min_by_key(|(rank, score)| (*rank, Reverse(*score)))
        .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn answer(text: &str, is_correct: bool, response_count: u64) -> AnswerRecord {
        AnswerRecord {
            text: text.to_string(),
            is_correct,
            response_count,
            ..Default::default()
        }
    }

    fn ranked(text: &str, rank: u32, score: u32) -> AnswerRecord {
        AnswerRecord {
            rank,
            score,
            ..answer(text, false, 1)
        }
    }

    fn with_id(a: AnswerRecord, id: &str) -> AnswerRecord {
        AnswerRecord {
            identifier: Some(id.to_string()),
            ..a
        }
    }

    fn texts(answers: &[AnswerRecord]) -> Vec<&str> {
        answers.iter().map(|a| a.text.as_str()).collect()
    }

    fn total(answers: &[AnswerRecord]) -> u64 {
        answers.iter().map(|a| a.response_count).sum()
    }

    // ********* Clustering ***********

    #[test]
    fn cluster_greeting_scenario() {
        init();
        let input = vec![
            answer("Namaste", false, 3),
            answer("namaste", true, 5),
            answer("Pranaam", false, 2),
        ];
        let res = cluster_answers(&input, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(
            res,
            vec![answer("namaste", true, 8), answer("Pranaam", false, 2)]
        );
    }

    #[test]
    fn cluster_empty() {
        init();
        assert!(cluster_answers(&[], 0.75).is_empty());
        let res = cluster_answers_stats(&[], 0.75);
        assert_eq!(res.duplicates_merged, 0);
    }

    #[test]
    fn cluster_conserves_counts() {
        init();
        let input = vec![
            answer("Agni", true, 4),
            answer("agnee", false, 2),
            answer("jal", false, 7),
            answer("Jala", false, 1),
            answer("", false, 3),
            answer("  ", false, 2),
            answer("vayu", true, 0),
        ];
        for threshold in [0.0, 0.3, 0.5, 0.75, 0.9, 1.0] {
            let res = cluster_answers(&input, threshold);
            assert_eq!(total(&res), total(&input), "threshold {}", threshold);
        }
    }

    #[test]
    fn cluster_threshold_boundary_merges() {
        init();
        // similarity("mata", "pata") == 0.75 exactly
        let input = vec![answer("mata", false, 1), answer("pata", false, 1)];
        assert_eq!(cluster_answers(&input, 0.75).len(), 1);
        assert_eq!(cluster_answers(&input, 0.76).len(), 2);
    }

    #[test]
    fn cluster_compares_with_seed_only() {
        init();
        // "abce" is close to both, but "abfe" is only compared with the seed "abcd" (0.5).
        let input = vec![
            answer("abcd", false, 1),
            answer("abce", false, 1),
            answer("abfe", false, 1),
        ];
        let res = cluster_answers_stats(&input, 0.75);
        assert_eq!(texts(&res.answers), vec!["abcd", "abfe"]);
        assert_eq!(res.duplicates_merged, 1);
    }

    #[test]
    fn cluster_is_order_dependent() {
        init();
        let a = answer("abcd", false, 1);
        let b = answer("abce", false, 1);
        let c = answer("abfe", false, 1);
        let res1 = cluster_answers(&[a.clone(), b.clone(), c.clone()], 0.75);
        let res2 = cluster_answers(&[b, a, c], 0.75);
        assert_eq!(res1.len(), 2);
        // "abce" as a seed absorbs both neighbours.
        assert_eq!(res2.len(), 1);
    }

    #[test]
    fn cluster_correct_seed_is_kept() {
        init();
        let input = vec![
            with_id(answer("Paris", true, 1), "a"),
            with_id(answer("paris", true, 10), "b"),
            with_id(answer("pariss", false, 20), "c"),
        ];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].text, "Paris");
        assert_eq!(res[0].identifier, Some("a".to_string()));
        assert!(res[0].is_correct);
        assert_eq!(res[0].response_count, 31);
    }

    #[test]
    fn cluster_first_correct_member_wins() {
        init();
        let input = vec![
            with_id(answer("pariss", false, 20), "a"),
            with_id(answer("paris", true, 1), "b"),
            with_id(answer("Paris", true, 10), "c"),
        ];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].text, "paris");
        assert_eq!(res[0].identifier, Some("b".to_string()));
        assert!(res[0].is_correct);
    }

    #[test]
    fn cluster_popular_incorrect_member_wins() {
        init();
        let input = vec![
            answer("rakta", false, 1),
            answer("Rakta", false, 5),
            answer("rakta ", false, 3),
            answer("RAKTA", false, 5),
        ];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res, vec![answer("RAKTA", false, 14)]);
    }

    #[test]
    fn cluster_incorrect_members_compare_with_seed() {
        init();
        // "rakta " has fewer responses than "Rakta" but more than the seed.
        let input = vec![
            answer("rakta", false, 1),
            answer("Rakta", false, 5),
            answer("rakta ", false, 3),
        ];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res, vec![answer("rakta ", false, 9)]);

        // Nobody beats the seed.
        let input = vec![answer("jala", false, 4), answer("Jala", false, 4)];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res[0].text, "jala");
    }

    #[test]
    fn cluster_saturates_huge_counts() {
        init();
        let input = vec![answer("agni", true, u64::MAX), answer("soma", false, 1)];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].response_count, u64::MAX);

        let input = vec![answer("agni", true, u64::MAX - 1), answer("Agni", false, 5)];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res, vec![answer("agni", true, u64::MAX)]);

        let ranked = rank_and_score_answers(&res, &DEFAULT_SCORE_TIERS);
        assert_eq!((ranked[0].rank, ranked[0].score), (1, 100));
    }

    #[test]
    fn cluster_correct_member_beats_popular_member() {
        init();
        let input = vec![
            answer("nila", false, 1),
            answer("Nila", false, 9),
            answer("neela", true, 2),
            answer("NILA", false, 30),
        ];
        let res = cluster_answers(&input, 0.6);
        assert_eq!(res, vec![answer("neela", true, 42)]);
    }

    #[test]
    fn cluster_keeps_identifier_when_canonical_has_none() {
        init();
        let input = vec![with_id(answer("eka", false, 1), "x"), answer("Eka", true, 1)];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res[0].text, "Eka");
        assert_eq!(res[0].identifier, Some("x".to_string()));
    }

    #[test]
    fn cluster_best_rank_is_carried() {
        init();
        let input = vec![
            ranked("dva", 0, 0),
            ranked("Dva", 3, 60),
            ranked("DVA", 2, 70),
            ranked("dva ", 2, 80),
        ];
        let res = cluster_answers(&input, 0.75);
        assert_eq!(res.len(), 1);
        assert_eq!((res[0].rank, res[0].score), (2, 80));

        let unranked = cluster_answers(&[ranked("eka", 0, 0), ranked("Eka", 0, 0)], 0.75);
        assert_eq!((unranked[0].rank, unranked[0].score), (0, 0));
    }

    #[test]
    fn cluster_empty_texts() {
        init();
        let input = vec![
            answer("", false, 1),
            answer("simha", false, 1),
            answer(" ", false, 2),
        ];
        let res = cluster_answers(&input, 0.75);
        // The two blank answers are identical once normalized.
        assert_eq!(texts(&res), vec![" ", "simha"]);
        assert_eq!(res[0].response_count, 3);
    }

    #[test]
    fn cluster_does_not_modify_input() {
        init();
        let input = vec![answer("Namaste", false, 3), answer("namaste", true, 5)];
        let copy = input.clone();
        let _ = cluster_answers(&input, 0.75);
        assert_eq!(input, copy);
    }

    // ********* Ranking ***********

    #[test]
    fn rank_basic_scenario() {
        init();
        let input = vec![
            answer("A", true, 10),
            answer("B", false, 8),
            answer("C", true, 6),
            answer("D", true, 4),
        ];
        let res = rank_and_score_answers(&input, &DEFAULT_SCORE_TIERS);
        let summary: Vec<(&str, u32, u32)> = res
            .iter()
            .map(|a| (a.text.as_str(), a.rank, a.score))
            .collect();
        assert_eq!(
            summary,
            vec![("A", 1, 100), ("C", 2, 80), ("D", 3, 60), ("B", 0, 0)]
        );
    }

    #[test]
    fn rank_overflow_tiers() {
        init();
        let input: Vec<AnswerRecord> = (0..6)
            .map(|i| answer(&format!("answer {}", i), true, 60 - 10 * i))
            .collect();
        let res = rank_and_score_answers_stats(&input, &DEFAULT_SCORE_TIERS);
        assert_eq!(res.answers_ranked, 6);
        assert_eq!(res.answers_scored, 5);
        let last = &res.answers[5];
        assert_eq!(last.text, "answer 5");
        assert_eq!((last.rank, last.score), (6, 0));
    }

    #[test]
    fn rank_empty() {
        init();
        assert!(rank_and_score_answers(&[], &DEFAULT_SCORE_TIERS).is_empty());
    }

    #[test]
    fn rank_all_incorrect() {
        init();
        let input = vec![
            ranked("x", 1, 100),
            answer("y", false, 50),
            ranked("z", 2, 80),
        ];
        let res = rank_and_score_answers_stats(&input, &DEFAULT_SCORE_TIERS);
        assert_eq!(texts(&res.answers), vec!["x", "y", "z"]);
        assert!(res.answers.iter().all(|a| a.rank == 0 && a.score == 0));
        assert_eq!(res.answers_ranked, 0);
    }

    #[test]
    fn rank_ties_keep_input_order() {
        init();
        let input = vec![
            answer("late", false, 9),
            answer("first", true, 5),
            answer("second", true, 5),
            answer("top", true, 7),
        ];
        let res = rank_and_score_answers(&input, &[10, 5]);
        assert_eq!(texts(&res), vec!["top", "first", "second", "late"]);
        assert_eq!(res[2].score, 0);
        assert_eq!(res[2].rank, 3);
    }

    #[test]
    fn rank_properties() {
        init();
        let input = vec![
            answer("a", false, 100),
            answer("b", true, 3),
            answer("c", true, 30),
            answer("d", false, 0),
            answer("e", true, 3),
            answer("f", true, 12),
            answer("g", true, 1),
            answer("h", true, 2),
            answer("i", false, 2),
        ];
        let once = rank_and_score_answers(&input, &DEFAULT_SCORE_TIERS);
        let twice = rank_and_score_answers(&once, &DEFAULT_SCORE_TIERS);
        assert_eq!(once, twice);

        // Correctness gate
        assert!(once.iter().filter(|a| !a.is_correct).all(|a| a.rank == 0));

        // Contiguous ranks
        let ranks: Vec<u32> = once.iter().filter(|a| a.is_correct).map(|a| a.rank).collect();
        let expected: Vec<u32> = (1..=6).collect();
        assert_eq!(ranks, expected);
    }

    #[test]
    fn rank_custom_tiers() {
        init();
        let input = vec![answer("a", true, 1), answer("b", true, 2)];
        let res = rank_and_score_answers(&input, &[]);
        assert_eq!(
            res.iter().map(|a| (a.rank, a.score)).collect::<Vec<_>>(),
            vec![(1, 0), (2, 0)]
        );
    }

    // ********* Full processing ***********

    #[test]
    fn process_question_full() {
        init();
        let question = QuestionRecord {
            text: "Name a Sanskrit word for a number.".to_string(),
            answers: vec![
                answer("eka", true, 4),
                answer("dva", true, 2),
                answer("Eka ", false, 3),
                answer("tri", false, 6),
                answer("dvaa", false, 1),
            ],
        };
        let res = process_question_stats(&question, &RankingRules::default());
        assert_eq!(res.duplicates_merged, 2);
        assert_eq!(res.answers_ranked, 2);
        assert_eq!(res.answers_scored, 2);
        let summary: Vec<(&str, u64, u32, u32)> = res
            .question
            .answers
            .iter()
            .map(|a| (a.text.as_str(), a.response_count, a.rank, a.score))
            .collect();
        assert_eq!(
            summary,
            vec![("eka", 7, 1, 100), ("dva", 3, 2, 80), ("tri", 6, 0, 0)]
        );
        assert_eq!(res.question.text, question.text);
    }

    #[test]
    fn process_question_without_answers() {
        init();
        let question = QuestionRecord {
            text: "Empty".to_string(),
            answers: vec![],
        };
        assert_eq!(process_question(&question, &RankingRules::default()), question);
    }

    #[test]
    fn process_question_is_stable() {
        init();
        let question = QuestionRecord {
            text: "q".to_string(),
            answers: vec![
                answer("Namaste", false, 3),
                answer("namaste", true, 5),
                answer("Pranaam", false, 2),
                answer("pranam", true, 1),
            ],
        };
        let rules = RankingRules::default();
        let once = process_question(&question, &rules);
        let twice = process_question(&once, &rules);
        assert_eq!(once, twice);
    }
}
