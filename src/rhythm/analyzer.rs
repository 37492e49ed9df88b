//! Rhythm analyzer
//!
//! One forward pass over the classified, path-resolved records. Each spine
//! carries the time left on its current note; a data line lasts until the
//! earliest of those runs out. Positions are exact rationals in quarter
//! notes, so sums over thousands of measures never drift.
//!
//! Per-column state (time remaining, running-status duration) is remapped
//! through the tracker's column links on every spined line, so it follows
//! each lineage through splits, merges and exchanges.

use crate::config::RhythmOptions;
use crate::error::RhythmError;
use crate::models::kern::{self, Pitch, TieMark};
use crate::models::{rational, Rational, Record, RecordKind};
use crate::structure::{LineBinding, PathHistory, TrackTable};

use super::meter::MeterTracker;
use super::ties::{NoteKey, TieTracker};

/// Results of one rhythm pass, indexed by record
#[derive(Debug, Clone)]
pub struct RhythmAnalysis {
    abs_beats: Vec<Rational>,
    durations: Vec<Rational>,
    token_durations: Vec<Vec<Option<Rational>>>,
    beat_durations: Vec<Rational>,
    measure_durations: Vec<Option<Rational>>,
    measure_starts: Vec<Option<Rational>>,
    measure_numbers: Vec<Option<i32>>,
    ties: TieTracker,
    pickup: Rational,
    minimum_time_base: i64,
    total: Rational,
}

impl Default for RhythmAnalysis {
    fn default() -> Self {
        Self {
            abs_beats: Vec::new(),
            durations: Vec::new(),
            token_durations: Vec::new(),
            beat_durations: Vec::new(),
            measure_durations: Vec::new(),
            measure_starts: Vec::new(),
            measure_numbers: Vec::new(),
            ties: TieTracker::new(),
            pickup: rational(0),
            minimum_time_base: 1,
            total: rational(0),
        }
    }
}

impl RhythmAnalysis {
    /// Start of a line, in quarter notes from the beginning of the file
    pub fn abs_beat(&self, line: usize) -> Option<Rational> {
        self.abs_beats.get(line).copied()
    }

    /// Time from this line to the next data line
    pub fn duration(&self, line: usize) -> Option<Rational> {
        self.durations.get(line).copied()
    }

    /// Written duration of one token; `None` for nulls and non-rhythmic fields
    pub fn token_duration(&self, line: usize, col: usize) -> Option<Rational> {
        self.token_durations.get(line)?.get(col).copied().flatten()
    }

    /// Beat length in force at a line
    pub fn beat_duration(&self, line: usize) -> Option<Rational> {
        self.beat_durations.get(line).copied()
    }

    /// Full measure length in force at a line, once a meter is known
    pub fn measure_duration(&self, line: usize) -> Option<Rational> {
        self.measure_durations.get(line).copied().flatten()
    }

    /// 1-based metric position within the measure.
    ///
    /// Lines before the first barline are shifted by the pickup so that the
    /// pickup ends on the last beat of a full measure.
    pub fn beat(&self, line: usize) -> Option<Rational> {
        let abs = self.abs_beat(line)?;
        let beat = self.beat_duration(line)?;
        let start = self.measure_starts.get(line).copied().flatten().unwrap_or(-self.pickup);
        Some((abs - start) / beat + rational(1))
    }

    pub fn measure_number(&self, line: usize) -> Option<i32> {
        self.measure_numbers.get(line).copied().flatten()
    }

    pub fn pickup_duration(&self) -> Rational {
        self.pickup
    }

    /// Least common denominator of all durations: ticks per quarter note
    pub fn minimum_time_base(&self) -> i64 {
        self.minimum_time_base
    }

    pub fn total_duration(&self) -> Rational {
        self.total
    }

    /// Total of the tie chain starting at this note
    pub fn tie_total(&self, key: NoteKey) -> Option<Rational> {
        self.ties.total(key)
    }

    /// Whether this note continues or ends a tie chain
    pub fn is_tie_member(&self, key: NoteKey) -> bool {
        self.ties.is_member(key)
    }

    pub fn line_count(&self) -> usize {
        self.abs_beats.len()
    }
}

/// Compute GCD of two numbers
fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

/// Compute LCM of two numbers; `None` on overflow
fn lcm(a: i64, b: i64) -> Option<i64> {
    if a == 0 || b == 0 {
        return Some(a.max(b));
    }
    (a / gcd(a, b)).checked_mul(b).map(i64::abs)
}

/// Carry per-column state from the previous spined line into this one
fn remap<T: Copy>(previous: &[T], binding: &LineBinding, empty: T) -> Vec<T> {
    binding
        .columns
        .iter()
        .map(|c| c.from.and_then(|f| previous.get(f).copied()).unwrap_or(empty))
        .collect()
}

/// Run the rhythm pass
pub fn analyze(
    records: &[Record],
    history: &PathHistory,
    tracks: &TrackTable,
    options: &RhythmOptions,
) -> Result<RhythmAnalysis, RhythmError> {
    let zero = rational(0);
    let mut analysis = RhythmAnalysis::default();
    let mut meters = MeterTracker::new();
    let mut ties = TieTracker::new();

    let mut remaining: Vec<Rational> = Vec::new();
    let mut running: Vec<Option<Rational>> = Vec::new();
    let mut abs = zero;
    let mut time_base: i64 = 1;
    let mut beat = rational(1);
    let mut measure: Option<Rational> = None;
    let mut measure_start: Option<Rational> = None;
    let mut measure_number: Option<i32> = None;
    let mut first_numbered: Option<(usize, i32)> = None;
    let mut barlines = Vec::new();

    for (line, record) in records.iter().enumerate() {
        let binding = history.get(line);
        let mut token_durations = vec![None; record.field_count()];
        let mut line_duration = zero;

        let rhythmic: Vec<bool> = match binding {
            Some(binding) => {
                remaining = remap(&remaining, binding, zero);
                running = remap(&running, binding, None);
                binding
                    .columns
                    .iter()
                    .map(|c| tracks.exinterp_of(c.track).map_or(false, |e| options.is_rhythmic(e)))
                    .collect()
            }
            None => Vec::new(),
        };
        let primary_at = |col: usize| {
            binding
                .and_then(|b| b.track(col))
                .and_then(|t| tracks.primary_of(t))
        };

        match record.kind() {
            RecordKind::Interpretation | RecordKind::ExclusiveInterpretation => {
                for (col, token) in record.tokens().iter().enumerate() {
                    if let Some(primary) = primary_at(col) {
                        meters.observe(primary, token.text());
                    }
                }
            }
            RecordKind::Barline => {
                measure_start = Some(abs);
                barlines.push(line);
                if let Some(number) = record.barline().and_then(|b| b.number) {
                    measure_number = Some(number);
                    if first_numbered.is_none() {
                        first_numbered = Some((line, number));
                    }
                }
            }
            RecordKind::Data => {
                let mut has_grace = false;
                for (col, token) in record.tokens().iter().enumerate() {
                    if !rhythmic.get(col).copied().unwrap_or(false) || token.is_null() {
                        continue;
                    }
                    let duration = match kern::token_duration(token.text()) {
                        Some(d) => d,
                        None => running.get(col).copied().flatten().unwrap_or_else(|| {
                            log::warn!(
                                "no rhythm at line {}, column {}: {:?}",
                                line + 1,
                                col + 1,
                                token.text()
                            );
                            zero
                        }),
                    };
                    if let Some(slot) = running.get_mut(col) {
                        *slot = Some(duration);
                    }
                    if let Some(slot) = remaining.get_mut(col) {
                        *slot = duration;
                    }
                    token_durations[col] = Some(duration);
                    if duration == zero {
                        has_grace = true;
                    }
                    time_base = lcm(time_base, *duration.denom()).ok_or(
                        RhythmError::TimeBaseOverflow {
                            line,
                            column: col,
                            denominator: *duration.denom(),
                        },
                    )?;

                    let primary = primary_at(col).unwrap_or(0);
                    for (sub, text) in token.subtokens().enumerate() {
                        let Some(mark) = TieMark::parse(text) else {
                            continue;
                        };
                        let sub_duration = kern::recip_duration(text).unwrap_or(duration);
                        let key = (line, col, sub);
                        let pitch = Pitch::parse(text);
                        match mark {
                            TieMark::Start => ties.start(primary, key, pitch, sub_duration),
                            TieMark::Continue => ties.extend(
                                primary,
                                key,
                                pitch,
                                sub_duration,
                                false,
                                options.max_tie_links,
                            )?,
                            TieMark::End => ties.extend(
                                primary,
                                key,
                                pitch,
                                sub_duration,
                                true,
                                options.max_tie_links,
                            )?,
                        }
                    }
                }

                line_duration = if has_grace {
                    zero
                } else {
                    remaining
                        .iter()
                        .zip(&rhythmic)
                        .filter(|(r, is_rhythmic)| **is_rhythmic && **r > zero)
                        .map(|(r, _)| *r)
                        .min()
                        .unwrap_or(zero)
                };
                for r in remaining.iter_mut() {
                    *r = if *r > line_duration { *r - line_duration } else { zero };
                }
            }
            _ => {}
        }

        // Line timing follows the leftmost rhythmic spine that defines one
        if binding.is_some() {
            let timing = (0..rhythmic.len())
                .filter(|&col| rhythmic[col])
                .filter_map(primary_at)
                .find_map(|p| meters.beat_duration(p).map(|b| (b, meters.measure_duration(p))));
            if let Some((b, m)) = timing {
                beat = b;
                measure = m.or(measure);
            }
        }

        analysis.abs_beats.push(abs);
        analysis.durations.push(line_duration);
        analysis.token_durations.push(token_durations);
        analysis.beat_durations.push(beat);
        analysis.measure_durations.push(measure);
        analysis.measure_starts.push(measure_start);
        analysis.measure_numbers.push(measure_number);
        abs += line_duration;
    }

    ties.finish();
    analysis.ties = ties;
    analysis.total = abs;
    analysis.minimum_time_base = time_base;

    if let Some((first_bar, number)) = first_numbered {
        for slot in analysis.measure_numbers[..first_bar].iter_mut() {
            if slot.is_none() {
                *slot = Some(number - 1);
            }
        }
        let content = analysis.abs_beats[first_bar];
        analysis.pickup = match analysis.measure_durations[first_bar] {
            Some(full) if content > zero && content < full => full - content,
            _ => zero,
        };
    }

    let grid = options.time_base.unwrap_or(time_base);
    for &line in &barlines {
        let position = analysis.abs_beats[line];
        if !(position * rational(grid)).is_integer() {
            return Err(RhythmError::NonIntegralBarline {
                line,
                position,
                time_base: grid,
            });
        }
    }

    log::debug!(
        "rhythm pass: {} lines, total {} quarters, time base {}, pickup {}",
        records.len(),
        analysis.total,
        analysis.minimum_time_base,
        analysis.pickup
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcm() {
        assert_eq!(lcm(1, 3), Some(3));
        assert_eq!(lcm(4, 6), Some(12));
        assert_eq!(lcm(2, 1), Some(2));
        assert_eq!(lcm(i64::MAX, 2), None);
    }

    #[test]
    fn test_time_base_overflow_fails_the_pass() {
        let file = crate::HumdrumFile::parse(
            "**kern\t**kern\t**kern\t**kern\n\
             1000003c\t1000033d\t1000037e\t1000039f\n\
             *-\t*-\t*-\t*-",
        );
        assert_eq!(
            file.rhythm().unwrap_err(),
            &RhythmError::TimeBaseOverflow {
                line: 1,
                column: 3,
                denominator: 1000039
            }
        );
    }
}
