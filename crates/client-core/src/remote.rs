//! Remote participant bookkeeping
//!
//! Subscriptions and visibility are tracked separately. A participant's
//! entry always reflects the tracks currently subscribed for its uid. The
//! entry becomes visible once a subscription completes and is hidden when
//! its video is unpublished; an audio unpublish only clears the audio track.
//! Hiding an entry does not drop its other subscriptions, so a participant
//! that turns its camera back on reappears with its audio intact.
//!
//! Visible entries list numeric uids ascending first, then string uids in
//! the order they became visible.

use std::collections::HashMap;

use crate::sdk::RemoteTrackRef;
use crate::types::{MediaKind, Uid};

/// A remote participant and its subscribed tracks
#[derive(Debug, Clone)]
pub struct RemoteParticipant {
    pub uid: Uid,
    pub audio_track: Option<RemoteTrackRef>,
    pub video_track: Option<RemoteTrackRef>,
}

impl RemoteParticipant {
    /// Participant with no subscribed tracks yet
    pub fn new(uid: Uid) -> Self {
        Self {
            uid,
            audio_track: None,
            video_track: None,
        }
    }

    /// Rendering label
    pub fn label(&self) -> String {
        format!("uid: {}", self.uid)
    }

    /// Subscribed track of the given kind
    pub fn track(&self, kind: MediaKind) -> Option<&RemoteTrackRef> {
        match kind {
            MediaKind::Audio => self.audio_track.as_ref(),
            MediaKind::Video => self.video_track.as_ref(),
        }
    }

    /// Whether no track is subscribed any more
    pub fn has_no_tracks(&self) -> bool {
        self.audio_track.is_none() && self.video_track.is_none()
    }

    fn set_track(&mut self, track: RemoteTrackRef) {
        match track.kind() {
            MediaKind::Audio => self.audio_track = Some(track),
            MediaKind::Video => self.video_track = Some(track),
        }
    }

    fn clear_track(&mut self, kind: MediaKind) -> Option<RemoteTrackRef> {
        match kind {
            MediaKind::Audio => self.audio_track.take(),
            MediaKind::Video => self.video_track.take(),
        }
    }
}

/// What an unpublish notification changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unpublished {
    /// The participant was hidden
    Removed,
    /// The track was cleared; the participant stays listed
    TrackCleared,
    /// Nothing was subscribed or listed for that uid and kind
    Unknown,
}

/// Remote participants keyed by uid
#[derive(Debug, Default)]
pub struct RemoteUsers {
    subscriptions: HashMap<Uid, RemoteParticipant>,
    /// Visible uids with the sequence number they became visible at
    visible: HashMap<Uid, u64>,
    next_seq: u64,
}

impl RemoteUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscribed track and make the participant visible
    pub fn merge(&mut self, uid: Uid, track: RemoteTrackRef) -> &RemoteParticipant {
        if !self.visible.contains_key(&uid) {
            self.visible.insert(uid.clone(), self.next_seq);
            self.next_seq += 1;
        }
        let entry = self
            .subscriptions
            .entry(uid.clone())
            .or_insert_with(|| RemoteParticipant::new(uid));
        entry.set_track(track);
        entry
    }

    /// Apply an unpublish notification
    ///
    /// The track of that kind is cleared. Video also hides the participant.
    pub fn unpublish(&mut self, uid: &Uid, kind: MediaKind) -> Unpublished {
        let cleared = match self.subscriptions.get_mut(uid) {
            Some(entry) => entry.clear_track(kind).is_some(),
            None => false,
        };
        let hidden = kind == MediaKind::Video && self.visible.remove(uid).is_some();
        let drop_record = !self.visible.contains_key(uid)
            && self.subscriptions.get(uid).is_some_and(RemoteParticipant::has_no_tracks);
        if drop_record {
            self.subscriptions.remove(uid);
        }
        match (hidden, cleared) {
            (true, _) => Unpublished::Removed,
            (false, true) => Unpublished::TrackCleared,
            (false, false) => Unpublished::Unknown,
        }
    }

    /// Visible participant with this uid
    pub fn get(&self, uid: &Uid) -> Option<&RemoteParticipant> {
        if !self.visible.contains_key(uid) {
            return None;
        }
        self.subscriptions.get(uid)
    }

    pub fn contains(&self, uid: &Uid) -> bool {
        self.visible.contains_key(uid)
    }

    /// Subscriptions held for a uid, visible or not
    pub fn subscriptions(&self, uid: &Uid) -> Option<&RemoteParticipant> {
        self.subscriptions.get(uid)
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Visible participants in rendering order
    pub fn iter(&self) -> impl Iterator<Item = &RemoteParticipant> {
        let mut order: Vec<(&Uid, u64)> = self.visible.iter().map(|(uid, seq)| (uid, *seq)).collect();
        order.sort_by_key(|(uid, seq)| match uid {
            Uid::Number(n) => (0, u64::from(*n)),
            Uid::Text(_) => (1, *seq),
        });
        order
            .into_iter()
            .filter_map(|(uid, _)| self.subscriptions.get(uid))
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackRemoteTrack;
    use std::sync::Arc;

    fn track(uid: impl Into<Uid>, kind: MediaKind) -> RemoteTrackRef {
        Arc::new(LoopbackRemoteTrack::new(uid.into(), kind))
    }

    #[test]
    fn merge_combines_audio_and_video_into_one_entry() {
        let mut users = RemoteUsers::new();
        users.merge(Uid::from(5u32), track(5u32, MediaKind::Video));
        let entry = users.merge(Uid::from(5u32), track(5u32, MediaKind::Audio));

        assert!(entry.video_track.is_some());
        assert!(entry.audio_track.is_some());
        assert_eq!(entry.label(), "uid: 5");
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn numeric_uids_come_first_then_strings_in_arrival_order() {
        let mut users = RemoteUsers::new();
        users.merge(Uid::from("zed"), track("zed", MediaKind::Video));
        users.merge(Uid::from(30u32), track(30u32, MediaKind::Video));
        users.merge(Uid::from("amy"), track("amy", MediaKind::Video));
        users.merge(Uid::from(10u32), track(10u32, MediaKind::Video));

        let order: Vec<_> = users.iter().map(|p| p.uid.to_string()).collect();
        assert_eq!(order, vec!["10", "30", "zed", "amy"]);
    }

    #[test]
    fn string_uid_moves_to_the_end_when_it_reappears() {
        let mut users = RemoteUsers::new();
        users.merge(Uid::from("bob"), track("bob", MediaKind::Video));
        users.merge(Uid::from("ann"), track("ann", MediaKind::Video));
        users.unpublish(&Uid::from("bob"), MediaKind::Video);
        users.merge(Uid::from("bob"), track("bob", MediaKind::Video));

        let order: Vec<_> = users.iter().map(|p| p.uid.to_string()).collect();
        assert_eq!(order, vec!["ann", "bob"]);
    }

    #[test]
    fn audio_unpublish_clears_the_track_but_keeps_the_entry() {
        let mut users = RemoteUsers::new();
        users.merge(Uid::from(8u32), track(8u32, MediaKind::Audio));
        users.merge(Uid::from(8u32), track(8u32, MediaKind::Video));

        assert_eq!(users.unpublish(&Uid::from(8u32), MediaKind::Audio), Unpublished::TrackCleared);

        let entry = users.get(&Uid::from(8u32)).unwrap();
        assert!(entry.audio_track.is_none());
        assert!(entry.video_track.is_some());
    }

    #[test]
    fn hidden_participant_keeps_its_audio_subscription() {
        let mut users = RemoteUsers::new();
        users.merge(Uid::from(4u32), track(4u32, MediaKind::Audio));
        users.merge(Uid::from(4u32), track(4u32, MediaKind::Video));

        assert_eq!(users.unpublish(&Uid::from(4u32), MediaKind::Video), Unpublished::Removed);
        assert!(users.get(&Uid::from(4u32)).is_none());
        assert!(users.subscriptions(&Uid::from(4u32)).unwrap().audio_track.is_some());
    }

    #[test]
    fn unpublish_of_unknown_uid_changes_nothing() {
        let mut users = RemoteUsers::new();
        assert_eq!(users.unpublish(&Uid::from(1u32), MediaKind::Video), Unpublished::Unknown);
        assert!(users.is_empty());
    }
}
