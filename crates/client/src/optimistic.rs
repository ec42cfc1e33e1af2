//! Local counter math applied before the server answers.
//!
//! Both toggles work from the view as it is now, so a second click before
//! the first response arrives builds on the first click instead of on stale
//! server numbers.

use pingspot_domain::{ReactionType, ReportView, VoteType};

/// Apply a vote click to `view`.
///
/// The same choice again retracts the vote; another choice moves it to the
/// new bucket; a first vote is added. Returns the viewer's vote afterwards.
pub fn toggle_vote(view: &mut ReportView, vote: VoteType) -> Option<VoteType> {
    let prior = view.current_vote();
    let mut counts = view.vote_counts();

    let current = if prior == Some(vote) {
        counts.decrement(vote);
        None
    } else {
        if let Some(prior) = prior {
            counts.decrement(prior);
        }
        counts.increment(vote);
        Some(vote)
    };

    view.set_votes(counts, current);
    current
}

/// Set the viewer's vote to `vote` without toggling.
///
/// Used when the server reports a different vote than the local one.
pub fn settle_vote(view: &mut ReportView, vote: Option<VoteType>) {
    let prior = view.current_vote();
    if prior == vote {
        return;
    }
    let mut counts = view.vote_counts();
    if let Some(prior) = prior {
        counts.decrement(prior);
    }
    if let Some(vote) = vote {
        counts.increment(vote);
    }
    view.set_votes(counts, vote);
}

/// Apply a like/dislike click to `view`. Returns the viewer's reaction afterwards.
pub fn toggle_reaction(view: &mut ReportView, reaction: ReactionType) -> Option<ReactionType> {
    let prior = view.current_reaction();
    let mut likes = view.total_like_reactions;
    let mut dislikes = view.total_dislike_reactions;

    let mut take = |r: ReactionType, delta: i8| {
        let bucket = match r {
            ReactionType::Like => &mut likes,
            ReactionType::Dislike => &mut dislikes,
        };
        *bucket = if delta < 0 {
            bucket.saturating_sub(1)
        } else {
            bucket.saturating_add(1)
        };
    };

    let current = if prior == Some(reaction) {
        take(reaction, -1);
        None
    } else {
        if let Some(prior) = prior {
            take(prior, -1);
        }
        take(reaction, 1);
        Some(reaction)
    };

    view.set_reactions(likes, dislikes, current);
    current
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::report;
    use pingspot_domain::ReportStatus;

    #[test]
    fn test_first_vote_on_empty_report() {
        let mut view = report(1, 9, ReportStatus::Waiting);

        let current = toggle_vote(&mut view, VoteType::OnProgress);

        assert_eq!(current, Some(VoteType::OnProgress));
        assert_eq!(
            (
                view.total_resolved_votes,
                view.total_on_progress_votes,
                view.total_not_resolved_votes
            ),
            (0, 1, 0)
        );
        assert_eq!(view.total_votes, 1);
        assert!(view.is_on_progress_by_current_user);
    }

    #[test]
    fn test_same_vote_twice_restores_counts() {
        let mut view = report(1, 9, ReportStatus::OnProgress);
        view.set_votes(pingspot_domain::VoteCounts::new(3, 1, 1), None);
        let before = view.clone();

        toggle_vote(&mut view, VoteType::Resolved);
        assert_eq!(view.total_votes, 6);
        toggle_vote(&mut view, VoteType::Resolved);

        assert_eq!(view, before);
        assert_eq!(view.current_vote(), None);
    }

    #[test]
    fn test_switch_keeps_total() {
        let mut view = report(1, 9, ReportStatus::OnProgress);
        view.set_votes(
            pingspot_domain::VoteCounts::new(2, 0, 1),
            Some(VoteType::Resolved),
        );

        toggle_vote(&mut view, VoteType::NotResolved);

        assert_eq!(view.total_votes, 3);
        assert_eq!(view.total_resolved_votes, 1);
        assert_eq!(view.total_not_resolved_votes, 2);
        assert_eq!(view.current_vote(), Some(VoteType::NotResolved));
    }

    #[test]
    fn test_rapid_clicks_never_exceed_one_vote() {
        let mut view = report(1, 9, ReportStatus::OnProgress);
        for vote in [
            VoteType::Resolved,
            VoteType::OnProgress,
            VoteType::NotResolved,
            VoteType::OnProgress,
            VoteType::Resolved,
        ] {
            toggle_vote(&mut view, vote);
            assert!(view.total_votes <= 1);
        }
        assert_eq!(view.total_votes, 1);
        assert_eq!(view.current_vote(), Some(VoteType::Resolved));
    }

    #[test]
    fn test_settle_vote_moves_local_vote() {
        let mut view = report(1, 9, ReportStatus::OnProgress);
        view.set_votes(
            pingspot_domain::VoteCounts::new(1, 0, 0),
            Some(VoteType::Resolved),
        );

        settle_vote(&mut view, None);
        assert_eq!(view.total_votes, 0);

        settle_vote(&mut view, Some(VoteType::NotResolved));
        assert_eq!(view.total_not_resolved_votes, 1);
        assert!(view.is_not_resolved_by_current_user);
    }

    #[test]
    fn test_like_then_dislike() {
        let mut view = report(1, 9, ReportStatus::Waiting);
        view.set_reactions(4, 1, None);

        assert_eq!(toggle_reaction(&mut view, ReactionType::Like), Some(ReactionType::Like));
        assert_eq!((view.total_like_reactions, view.total_dislike_reactions), (5, 1));

        assert_eq!(
            toggle_reaction(&mut view, ReactionType::Dislike),
            Some(ReactionType::Dislike)
        );
        assert_eq!((view.total_like_reactions, view.total_dislike_reactions), (4, 2));
        assert_eq!(view.total_reactions, 6);

        assert_eq!(toggle_reaction(&mut view, ReactionType::Dislike), None);
        assert_eq!((view.total_like_reactions, view.total_dislike_reactions), (4, 1));
        assert!(!view.is_disliked_by_current_user);
    }
}
