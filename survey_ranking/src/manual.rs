/*!

This is the long-form manual for `survey_ranking` and `surveyrank`.

## Processing

Every question is processed independently, in two steps.

### Clustering

Respondents type their answers, so the same answer comes in many spellings:
`Namaste`, `namaste `, `Namastey`. The answers are compared after lowercasing and
trimming them. The similarity of two answers is `1 - d / n` where `d` is the
Levenshtein distance between the two texts and `n` the length of the longer one.
Two answers with a similarity of at least the threshold (0.75 by default) are merged.

The clustering goes through the answers in order. The first answer not yet merged
starts a new cluster and all the later answers similar to it join that cluster.
Note that the answers are only compared to the first answer of the cluster: with
`abcd`, `abce`, `abfe`, the last answer does not join the first cluster even
though it is close to `abce`. Reordering the input may change the clusters.

The merged answer gets:
- the sum of all the response counts
- the correct flag if any of the merged answers is correct
- the text of the first answer, unless a later answer is correct and the first one
  is not (the first correct one is used), or none of the answers are correct and a
  later answer is more popular (the most popular one is used, the earliest on ties)
- the best rank and score already present among the merged answers, if any.

### Ranking

Only the correct answers are ranked, by decreasing number of responses. Answers with
the same number of responses are ranked in the order they appear. The first ranks
receive the points from the score tiers (`100, 80, 60, 40, 20` by default). Further
correct answers still get a rank, but no points. Incorrect answers get a rank and a
score of 0.

## Input formats

The following formats are supported by `surveyrank`:
* `json` the questions as exported by the survey backend
* `csv` one line per answer
* `forms` Excel export from Microsoft Forms or Google Forms

### `json`

A list of questions, either directly or under a `questions` or `data` key:

```text
[
  {
    "_id": "q1",
    "question": "Name a common Sanskrit greeting.",
    "questionCategory": "Greetings",
    "answers": [
      { "answer": "Namaste", "isCorrect": false, "responseCount": 3 },
      { "answer": "namaste", "isCorrect": true, "responseCount": 5, "_id": "a2" }
    ]
  }
]
```

All the answer fields except `answer` are optional. All the other fields of the
question are copied to the output as they are.

### `csv`

One line per answer, with the question in `questionColumnIndex` and the answer in
`answerColumnIndex`. The optional `countColumnIndex` gives the number of respondents
for this line (1 otherwise) and the optional `correctColumnIndex` contains `true`,
`yes`, `y` or `1` for correct answers. The reading starts at the 1-based row
`firstAnswerRowIndex`, which is 2 by default to skip a header line. Columns are given
as numbers starting at 1 or as Excel letters (`A`, `B`, ...).

### `forms`

An Excel file in which every column is a question and every row the responses of one
person. The first row contains the titles of the questions. The columns to read are
given with `questions` (or `--questions` on the command line), or are all the columns
starting at `answerColumnIndex`.

## Correct answers

Answers can be marked as correct with the `answerKeys` section of the configuration:

```text
"answerKeys": [
  { "question": "Name a Sanskrit word for a number.", "answers": ["eka", "dva"] }
]
```

An answer is marked as correct when its lowercased and trimmed text is the same as
one of the keys.

## Final export

With `finalExport`, only the questions of type `input` (or without a type) that have
at least `minimumCorrectAnswers` correct answers (3 by default) are written, with their
correct answers only.

The type is read from the `questionType` field of the question and compared without
case. The CSV and forms sources carry no type, so their questions are treated as
`input`: a question without a type is accepted, where a strict export would reject it.
Every other type (`mcq`, `image`, ...) is counted in `skippedWrongType`.

*/
