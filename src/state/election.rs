use std::collections::HashMap;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::model::{
    admin::{Admin, AdminSession},
    candidate::{Candidate, CandidateUpdate, Category, NewCandidate},
    seed::Seed,
    voter::{UserVotes, VoteRecord, VoterSession},
};
use crate::storage::{votes_key, KeyValueStore, Persisted, Repo};

use super::reconcile::reconcile;

/// What happened to a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was counted.
    Recorded(Category),
    /// Nobody is signed in as a voter.
    NoSession,
    /// No candidate has the given ID.
    UnknownCandidate,
    /// The voter already has a choice for this category.
    AlreadyVoted(Category),
}

/// The application state: candidates, administrators, and the current
/// voter and administrator sessions.
///
/// Every mutation is mirrored to the store. A failed write is logged and
/// the state carries on in memory.
pub struct ElectionState {
    store: Arc<dyn KeyValueStore>,
    candidates: Vec<Candidate>,
    admins: Vec<Admin>,
    user_session: Option<VoterSession>,
    admin_session: Option<AdminSession>,
    /// Choices made through this state, by DNI. Covers vote records whose
    /// write to the store failed.
    recorded_votes: HashMap<String, VoteRecord>,
}

impl ElectionState {
    /// Build the state from whatever the store holds, merged with `seed`.
    pub fn load(store: Arc<dyn KeyValueStore>, seed: Seed) -> Self {
        let candidates = match load_or_warn::<Vec<Candidate>>(&store) {
            Some(stored) => reconcile(stored, seed.candidates, |c| c.id.clone()),
            None => seed.candidates,
        };
        let admins = match load_or_warn::<Vec<Admin>>(&store) {
            Some(stored) => reconcile(stored, seed.admins, |a| a.email.clone()),
            None => seed.admins,
        };
        let user_session = load_or_warn::<VoterSession>(&store);
        let admin_session = load_or_warn::<AdminSession>(&store);

        info!(
            "Loaded {} candidates and {} administrators",
            candidates.len(),
            admins.len()
        );

        Self {
            store,
            candidates,
            admins,
            user_session,
            admin_session,
            recorded_votes: HashMap::new(),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn admins(&self) -> &[Admin] {
        &self.admins
    }

    pub fn user_session(&self) -> Option<&VoterSession> {
        self.user_session.as_ref()
    }

    pub fn admin_session(&self) -> Option<&AdminSession> {
        self.admin_session.as_ref()
    }

    /// Sign a voter in. Always succeeds; the flags come from the voter's
    /// existing vote record.
    pub fn login_user(&mut self, dni: &str) -> VoterSession {
        let record = self.vote_record(dni);
        let session = VoterSession::from_record(dni, &record);
        debug!(
            "Voter {dni} signed in (presidencia: {}, alcaldia: {})",
            session.voted_presidencia, session.voted_alcaldia
        );
        self.user_session = Some(session.clone());
        self.persist(self.user_session.as_ref());
        session
    }

    pub fn logout_user(&mut self) {
        self.user_session = None;
        self.persist::<VoterSession>(None);
    }

    /// Sign an administrator in. Unknown email and wrong password are not
    /// distinguished.
    pub fn login_admin(&mut self, email: &str, password: &str) -> bool {
        let session = match self.admins.iter().find(|a| a.matches(email, password)) {
            Some(admin) => admin.session(),
            None => {
                info!("Rejected administrator sign-in");
                return false;
            }
        };
        info!("Administrator {} signed in", session.email);
        self.admin_session = Some(session);
        self.persist(self.admin_session.as_ref());
        true
    }

    /// Create an administrator account and sign it in. Fails if the email
    /// (compared exactly) is taken.
    pub fn register_admin(&mut self, name: &str, email: &str, password: &str) -> bool {
        if self.admins.iter().any(|a| a.email == email) {
            info!("Refused to register duplicate administrator {email}");
            return false;
        }
        let admin = Admin {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.admin_session = Some(admin.session());
        self.admins.push(admin);
        self.persist(Some(&self.admins));
        self.persist(self.admin_session.as_ref());
        info!("Registered administrator {email}");
        true
    }

    pub fn logout_admin(&mut self) {
        self.admin_session = None;
        self.persist::<AdminSession>(None);
    }

    /// Add a candidate with a fresh ID and no votes.
    pub fn add_candidate(&mut self, new: NewCandidate) -> Candidate {
        let candidate = Candidate::from_new(new);
        info!(
            "Added {} candidate {} ({})",
            candidate.category, candidate.id, candidate.name
        );
        self.candidates.push(candidate.clone());
        self.persist(Some(&self.candidates));
        candidate
    }

    /// Merge `update` into the candidate with `id`. `None` if there is no such
    /// candidate.
    pub fn update_candidate(&mut self, id: &str, update: CandidateUpdate) -> Option<Candidate> {
        let candidate = self.candidates.iter_mut().find(|c| c.id == id)?;
        candidate.apply(update);
        let updated = candidate.clone();
        self.persist(Some(&self.candidates));
        info!("Updated candidate {id}");
        Some(updated)
    }

    /// Remove the candidate with `id`. Returns whether anything was removed.
    pub fn delete_candidate(&mut self, id: &str) -> bool {
        let before = self.candidates.len();
        self.candidates.retain(|c| c.id != id);
        if self.candidates.len() == before {
            return false;
        }
        self.persist(Some(&self.candidates));
        info!("Deleted candidate {id}");
        true
    }

    /// Cast the signed-in voter's vote for `candidate_id`.
    ///
    /// At most one choice per category is ever recorded for a DNI. Both the
    /// session flag and the vote record are checked before writing.
    pub fn vote_for_candidate(&mut self, candidate_id: &str) -> VoteOutcome {
        let (dni, category, already_flagged) =
            match (&self.user_session, self.candidate(candidate_id)) {
                (None, _) => return VoteOutcome::NoSession,
                (Some(_), None) => return VoteOutcome::UnknownCandidate,
                (Some(session), Some(candidate)) => (
                    session.dni.clone(),
                    candidate.category,
                    session.has_voted(candidate.category),
                ),
            };
        if already_flagged {
            return VoteOutcome::AlreadyVoted(category);
        }

        let mut record = self.vote_record(&dni);
        if !record.record(category, candidate_id) {
            warn!("Voter {dni} session said no {category} vote, but the record has one");
            self.mark_session_voted(category);
            return VoteOutcome::AlreadyVoted(category);
        }

        if let Err(err) = Repo::<VoteRecord>::keyed(&self.store, votes_key(&dni)).save(&record) {
            warn!("Could not persist vote record for {dni}, continuing in memory: {err}");
        }
        self.recorded_votes.insert(dni.clone(), record);

        if let Some(candidate) = self.candidates.iter_mut().find(|c| c.id == candidate_id) {
            candidate.votes = candidate.votes.saturating_add(1);
        }
        self.persist(Some(&self.candidates));
        self.mark_session_voted(category);

        info!("Recorded {category} vote from {dni}");
        VoteOutcome::Recorded(category)
    }

    /// The signed-in voter's choices; all `None` without a session.
    pub fn user_votes(&self) -> UserVotes {
        match &self.user_session {
            Some(session) => UserVotes::from(&self.vote_record(&session.dni)),
            None => UserVotes::default(),
        }
    }

    fn mark_session_voted(&mut self, category: Category) {
        if let Some(session) = self.user_session.as_mut() {
            session.mark_voted(category);
        }
        self.persist(self.user_session.as_ref());
    }

    /// The stored vote record for `dni`, completed with any choice recorded
    /// here that did not make it into the store.
    fn vote_record(&self, dni: &str) -> VoteRecord {
        let stored = match Repo::<VoteRecord>::keyed(&self.store, votes_key(dni)).load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!("Could not read vote record for {dni}: {err}");
                None
            }
        };
        match (stored, self.recorded_votes.get(dni)) {
            (Some(stored), Some(recorded)) => stored.merged_with(recorded),
            (Some(stored), None) => stored,
            (None, Some(recorded)) => recorded.clone(),
            (None, None) => VoteRecord::default(),
        }
    }

    /// Write `value` under its key, or remove the key for `None`.
    fn persist<T>(&self, value: Option<&T>)
    where
        T: Persisted + Serialize,
    {
        let repo = Repo::<T>::from_store(&self.store);
        let result = match value {
            Some(value) => repo.save(value),
            None => repo.clear(),
        };
        if let Err(err) = result {
            warn!("Could not persist `{}`, continuing in memory: {err}", T::KEY);
        }
    }
}

/// Load a value, treating unreadable data as absent.
fn load_or_warn<T>(store: &Arc<dyn KeyValueStore>) -> Option<T>
where
    T: Persisted + DeserializeOwned,
{
    match Repo::<T>::from_store(store).load() {
        Ok(value) => value,
        Err(err) => {
            warn!("Ignoring stored `{}`: {err}", T::KEY);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::MemoryStore;

    use super::*;

    fn memory() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    fn state_on(store: &Arc<MemoryStore>) -> ElectionState {
        let store: Arc<dyn KeyValueStore> = store.clone();
        ElectionState::load(store, Seed::demo())
    }

    fn votes_of(state: &ElectionState, id: &str) -> u64 {
        state.candidate(id).map(|c| c.votes).unwrap()
    }

    #[test]
    fn fresh_store_uses_seed() {
        let state = state_on(&memory());
        assert_eq!(state.candidates(), Seed::demo().candidates.as_slice());
        assert_eq!(state.admins(), Seed::demo().admins.as_slice());
        assert!(state.user_session().is_none());
        assert!(state.admin_session().is_none());
    }

    #[test]
    fn persisted_candidates_win_over_seed() {
        let store = memory();
        let mut edited = Seed::demo().candidates[1].clone();
        edited.votes = 42;
        let extra = Candidate::example("pX", Category::Presidencia, 1);
        store
            .set(
                "candidates",
                &rocket::serde::json::serde_json::to_string(&vec![edited, extra]).unwrap(),
            )
            .unwrap();

        let state = state_on(&store);
        let ids: Vec<_> = state.candidates().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "pX", "p1", "p3", "a1", "a2", "a3"]);
        assert_eq!(votes_of(&state, "p2"), 42);
    }

    #[test]
    fn corrupt_collections_fall_back_to_seed() {
        let store = memory();
        store.set("candidates", "{broken").unwrap();
        store.set("admins", "42").unwrap();
        store.set("userSession", "nope").unwrap();

        let state = state_on(&store);
        assert_eq!(state.candidates().len(), 6);
        assert_eq!(state.admins().len(), 1);
        assert!(state.user_session().is_none());
    }

    #[test]
    fn sessions_are_restored() {
        let store = memory();
        {
            let mut state = state_on(&store);
            state.login_user("1234567");
            assert!(state.login_admin("admin@demo.com", "Demo123!"));
        }
        let state = state_on(&store);
        assert_eq!(state.user_session().map(|s| s.dni.as_str()), Some("1234567"));
        assert_eq!(
            state.admin_session().map(|s| s.email.as_str()),
            Some("admin@demo.com")
        );
    }

    #[test]
    fn admin_login_is_exact_and_generic() {
        let mut state = state_on(&memory());
        assert!(!state.login_admin("admin@demo.com", "wrong"));
        assert!(!state.login_admin("nobody@demo.com", "Demo123!"));
        assert!(!state.login_admin("ADMIN@demo.com", "Demo123!"));
        assert!(state.admin_session().is_none());

        assert!(state.login_admin("admin@demo.com", "Demo123!"));
        assert_eq!(
            state.admin_session(),
            Some(&AdminSession {
                email: "admin@demo.com".to_string(),
                name: "Admin Demo".to_string(),
            })
        );

        state.logout_admin();
        assert!(state.admin_session().is_none());
    }

    #[test]
    fn register_duplicate_email_fails_without_change() {
        let mut state = state_on(&memory());
        let before = state.admins().len();
        assert!(!state.register_admin("Otro", "admin@demo.com", "x"));
        assert_eq!(state.admins().len(), before);
        assert!(state.admin_session().is_none());
    }

    #[test]
    fn register_logs_in_and_persists() {
        let store = memory();
        let mut state = state_on(&store);
        assert!(state.register_admin("Lucía", "lucia@example.com", "secreto"));
        assert_eq!(
            state.admin_session().map(|s| s.name.as_str()),
            Some("Lucía")
        );

        let reloaded = state_on(&store);
        assert_eq!(reloaded.admins().len(), 2);
        let mut reloaded = reloaded;
        assert!(reloaded.login_admin("lucia@example.com", "secreto"));
    }

    #[test]
    fn add_then_update_votes() {
        let mut state = state_on(&memory());
        let added = state.add_candidate(NewCandidate::example());
        assert_eq!(added.votes, 0);

        let update = CandidateUpdate {
            votes: Some(5),
            ..Default::default()
        };
        state.update_candidate(&added.id, update).unwrap();

        let read = state.candidate(&added.id).unwrap();
        assert_eq!(read.votes, 5);
        assert_eq!(read.name, added.name);
        assert_eq!(read.party, added.party);
        assert_eq!(read.description, added.description);
        assert_eq!(read.image, added.image);
        assert_eq!(read.category, added.category);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut state = state_on(&memory());
        let before = state.candidates().to_vec();
        assert!(state
            .update_candidate("zz", CandidateUpdate::default())
            .is_none());
        assert!(!state.delete_candidate("zz"));
        assert_eq!(state.candidates(), before.as_slice());

        assert!(state.delete_candidate("a3"));
        assert!(state.candidate("a3").is_none());
    }

    #[test]
    fn vote_without_session_or_candidate() {
        let mut state = state_on(&memory());
        assert_eq!(state.vote_for_candidate("p1"), VoteOutcome::NoSession);

        state.login_user("1234567");
        assert_eq!(
            state.vote_for_candidate("nobody"),
            VoteOutcome::UnknownCandidate
        );
        assert!(state.candidates().iter().all(|c| c.votes == 0));
    }

    #[test]
    fn one_vote_per_category() {
        let mut state = state_on(&memory());
        state.login_user("1234567");

        assert_eq!(
            state.vote_for_candidate("p1"),
            VoteOutcome::Recorded(Category::Presidencia)
        );
        assert_eq!(votes_of(&state, "p1"), 1);

        assert_eq!(
            state.vote_for_candidate("p2"),
            VoteOutcome::AlreadyVoted(Category::Presidencia)
        );
        assert_eq!(votes_of(&state, "p1"), 1);
        assert_eq!(votes_of(&state, "p2"), 0);

        // The other office is still open.
        assert_eq!(
            state.vote_for_candidate("a2"),
            VoteOutcome::Recorded(Category::Alcaldia)
        );
        let session = state.user_session().unwrap();
        assert!(session.voted_presidencia && session.voted_alcaldia);
    }

    #[test]
    fn user_votes_reports_choices() {
        let mut state = state_on(&memory());
        assert_eq!(state.user_votes(), UserVotes::default());

        state.login_user("1234567");
        state.vote_for_candidate("p1");
        assert_eq!(
            state.user_votes(),
            UserVotes {
                presidencia: Some("p1".to_string()),
                alcaldia: None,
            }
        );
    }

    #[test]
    fn relogin_restores_flags() {
        let mut state = state_on(&memory());
        let first = state.login_user("7654321");
        state.vote_for_candidate("a1");
        let after_vote = state.user_session().cloned().unwrap();
        assert_ne!(first, after_vote);

        state.logout_user();
        assert!(state.user_session().is_none());

        let again = state.login_user("7654321");
        assert_eq!(again, after_vote);
        assert_eq!(state.vote_for_candidate("a3"), VoteOutcome::AlreadyVoted(Category::Alcaldia));
    }

    #[test]
    fn stale_session_flag_cannot_double_vote() {
        let store = memory();
        let mut state = state_on(&store);
        state.login_user("1234567");
        state.vote_for_candidate("p1");

        // Another context signs the same voter in with a session that predates the vote.
        store
            .set(
                "userSession",
                r#"{"dni":"1234567","votedPresidencia":false,"votedAlcaldia":false}"#,
            )
            .unwrap();
        let mut other = state_on(&store);
        assert_eq!(
            other.vote_for_candidate("p3"),
            VoteOutcome::AlreadyVoted(Category::Presidencia)
        );
        assert_eq!(votes_of(&other, "p3"), 0);
        assert!(other.user_session().unwrap().voted_presidencia);
    }

    #[test]
    fn failed_writes_keep_working_in_memory() {
        log4rs_test_utils::test_logging::init_logging_once_for(["voto_backend"], None, None);

        let store = memory();
        store.set_read_only(true);
        let mut state = state_on(&store);

        let session = state.login_user("1234567");
        assert_eq!(state.user_session(), Some(&session));
        assert_eq!(
            state.vote_for_candidate("p2"),
            VoteOutcome::Recorded(Category::Presidencia)
        );
        assert_eq!(votes_of(&state, "p2"), 1);
        assert!(store.is_empty());

        // The failed write must not reopen the category after signing in again.
        state.logout_user();
        let again = state.login_user("1234567");
        assert!(again.voted_presidencia);
        assert_eq!(
            state.vote_for_candidate("p3"),
            VoteOutcome::AlreadyVoted(Category::Presidencia)
        );
        assert_eq!(state.user_votes().presidencia.as_deref(), Some("p2"));
    }
}
