// Assignee Selector - pure least-loaded assignment policy

use crate::domain::ModeratorCandidate;

/// Pick an assignee among skill-matching candidates.
///
/// Empty `required_skills` signals "use admin fallback" and returns `None`
/// immediately. Otherwise candidates are filtered to those whose skill set
/// intersects the requirement; the least-loaded one wins, ties broken by
/// input order (first seen wins). Greedy per-ticket assignment, not a
/// global balance.
pub fn select<'a>(
    required_skills: &[String],
    candidates: &'a [ModeratorCandidate],
) -> Option<&'a ModeratorCandidate> {
    if required_skills.is_empty() {
        return None;
    }

    let mut best: Option<&ModeratorCandidate> = None;
    for candidate in candidates {
        if !candidate.user.has_any_skill(required_skills) {
            continue;
        }
        // Strict less-than keeps the first-seen candidate on ties
        match best {
            Some(b) if candidate.workload >= b.workload => {}
            _ => best = Some(candidate),
        }
    }
    best
}
