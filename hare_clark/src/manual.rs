/*!

This is the long-form manual for `hare_clark` and `hctab`.

## The count

Each position is counted separately with the Hare-Clark method:

1. The quota is `ballots / (vacancies + 1) + 1`. It is a real number: with
   10 ballots and 2 vacancies it is 4.333..., not 4.
2. Every ballot counts for its first preference with a weight of 1.
3. In each round, the candidate with the most votes is elected if its tally
   is strictly above the quota. Its surplus (tally minus quota) is passed on:
   every ballot it holds continues with weight multiplied by
   `surplus / tally`.
4. Otherwise the candidate with the fewest votes is eliminated and its
   ballots continue with their full weight.
5. Ballots skip candidates already elected or eliminated. A ballot with no
   continuing preference is exhausted and no longer counts.
6. Counting stops when the number of continuing candidates is no greater
   than the number of seats left. The continuing candidates are then elected
   in roster order.

Ties inside the count follow the roster order: among candidates with the
same highest tally, the last one listed is considered first; among
candidates with the same lowest tally, the first one listed is eliminated.

If all the continuing candidates have exactly the same tally, the count
stops and reports a tie. The raw result then lists every tied candidate as
elected, which may be more candidates than seats. The `tiebreakMode` rule
decides what to do with it:

- `report` (default): keep the raw result and flag the tie;
- `useCandidateOrder`: fill the seats left with the tied candidates in
  roster order;
- `random`: fill the seats left with the tied candidates ordered by the
  SHA-256 hash of the `randomSeed` (eight digits) followed by the candidate
  id. Anyone with the seed can check the order.

## Input formats

### Election file (`--config`)

```text
{
  "outputSettings": {"contestName": "Club committee 2024"},
  "rules": {"tiebreakMode": "useCandidateOrder"},
  "positions": [
    {
      "id": "treasurer",
      "name": "Treasurer",
      "vacancies": 1,
      "candidates": [{"id": "c1", "name": "Alice"}, {"id": "c2", "name": "Bob"}],
      "ballots": [["c1", "c2"], ["c2"]]
    }
  ]
}
```

Each position may also take:
- `ballotFiles`: CSV files with more ballots (see below), relative to the
  election file;
- `candidates[].excluded`: `true` to withdraw a candidate. It is removed from
  the roster and from every ballot;
- `manualWinners`: candidate ids that win this position regardless of the
  count. The count is still run to rank the other candidates.

### CSV ballots (`--input` or `ballotFiles`)

One ballot per row, preferences from left to right:

```text
id,count,choice 1,choice 2,choice 3
b1,20,c1,c2,
b2,3,c2,,
```

A cell holds a candidate id or a candidate name. Empty cells are skipped.
With `--input`, every cell of every row is a preference: there is no header
and no other column. For `ballotFiles`, the settings are:
- `firstVoteColumnIndex` (default 1): the column of the first preference,
  starting at 1;
- `firstVoteRowIndex` (default 1): the first row with a ballot, starting at
  1. Use 2 to skip a header;
- `countColumnIndex` (optional): a column holding how many times the row is
  repeated.

## Output

`hctab` writes a JSON summary with, for each position, the quota
(`threshold`), the winners, all the candidates ranked (winners first, then
by final tally, Borda points and name), and the rounds of the count: the
tallies at the start of the round and the transfers of the candidate elected
or eliminated. A round that ends on a tie lists the tied candidates in
`tied`. All the numbers of the count are written with four decimals.
Positions that cannot be counted report an `error` and do not prevent the
other positions from being counted.

*/
