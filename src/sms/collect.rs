// ABOUTME: Reassembles concatenated message segments keyed by originator and reference
// ABOUTME: Emits each complete group exactly once, in sequence order, with optional expiry

use crate::pdu::tpdu::Tpdu;
use crate::pdu::PduError;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Callback invoked when a group expires incomplete.
pub type ExpiryHandler = Arc<dyn Fn(ExpiredGroup) + Send + Sync>;

/// An incomplete group removed by the reassembly deadline.
#[derive(Clone, Debug)]
pub struct ExpiredGroup {
    pub reference: u16,
    pub total: u8,
    /// The segments received before expiry, in sequence order.
    pub segments: Vec<Tpdu>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    originator: String,
    reference: u16,
    total: u8,
}

struct Group {
    segments: BTreeMap<u8, Tpdu>,
    created: Instant,
}

struct Shared {
    groups: Mutex<HashMap<GroupKey, Group>>,
    timeout: Option<Duration>,
    on_expiry: Option<ExpiryHandler>,
    closed: AtomicBool,
}

/// Collects concatenated segments until each group is complete.
///
/// [`Collector::collect`] is safe to call from multiple tasks; the internal
/// lock covers only table access, never user callbacks.
#[derive(Clone)]
pub struct Collector {
    shared: Arc<Shared>,
}

impl Default for Collector {
    fn default() -> Self {
        Collector::new()
    }
}

impl Collector {
    /// A collector that keeps partial groups until completion or
    /// [`Collector::close`].
    pub fn new() -> Self {
        Collector {
            shared: Arc::new(Shared {
                groups: Mutex::new(HashMap::new()),
                timeout: None,
                on_expiry: None,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// A collector that drops groups still incomplete after `timeout`,
    /// reporting them through `on_expiry`. Requires a tokio runtime.
    pub fn with_timeout(timeout: Duration, on_expiry: Option<ExpiryHandler>) -> Self {
        Collector {
            shared: Arc::new(Shared {
                groups: Mutex::new(HashMap::new()),
                timeout: Some(timeout),
                on_expiry,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Feed one TPDU. A TPDU without a concatenation header is returned
    /// immediately as a complete single-segment list. A segment completing
    /// its group returns the whole group in ascending sequence order; any
    /// other segment returns an empty list.
    pub fn collect(&self, tpdu: Tpdu) -> Result<Vec<Tpdu>, PduError> {
        let Some(concat) = tpdu.concatenation() else {
            return Ok(vec![tpdu]);
        };

        if concat.total < 2 || concat.sequence == 0 || concat.sequence > concat.total {
            return Err(PduError::BadUdh("concatenation sequence out of range"));
        }

        let key = GroupKey {
            originator: tpdu.peer().number.clone(),
            reference: concat.reference,
            total: concat.total,
        };

        let mut groups = lock(&self.shared.groups);
        let group = groups.entry(key.clone()).or_insert_with(|| Group {
            segments: BTreeMap::new(),
            created: Instant::now(),
        });

        if group.segments.contains_key(&concat.sequence) {
            return Err(PduError::DuplicateSegment {
                reference: concat.reference,
                sequence: concat.sequence,
            });
        }

        let start_timer = group.segments.is_empty();
        let created = group.created;
        group.segments.insert(concat.sequence, tpdu);

        if group.segments.len() == usize::from(concat.total) {
            let group = groups.remove(&key);
            return Ok(group
                .map(|g| g.segments.into_values().collect())
                .unwrap_or_default());
        }
        drop(groups);

        if start_timer {
            if let Some(timeout) = self.shared.timeout {
                let shared = self.shared.clone();
                tokio::spawn(expire_after(shared, key, created, timeout));
            }
        }
        Ok(Vec::new())
    }

    /// Number of groups still waiting for segments.
    pub fn pending_groups(&self) -> usize {
        lock(&self.shared.groups).len()
    }

    /// Drop all partial groups and stop expiry reporting. Idempotent.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        lock(&self.shared.groups).clear();
    }
}

async fn expire_after(shared: Arc<Shared>, key: GroupKey, created: Instant, timeout: Duration) {
    tokio::time::sleep_until(created + timeout).await;

    let expired = {
        let mut groups = lock(&shared.groups);
        // A completed-and-recreated group carries a newer stamp; leave it.
        let stale = groups.get(&key).is_some_and(|group| group.created == created);
        if stale {
            groups.remove(&key)
        } else {
            None
        }
    };

    let Some(group) = expired else { return };
    if shared.closed.load(Ordering::SeqCst) {
        return;
    }
    let error = PduError::ReassemblyTimeout {
        reference: key.reference,
        total: key.total,
        received: group.segments.len() as u8,
    };
    tracing::debug!(%error, "dropping incomplete group");
    if let Some(handler) = &shared.on_expiry {
        handler(ExpiredGroup {
            reference: key.reference,
            total: key.total,
            segments: group.segments.into_values().collect(),
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::address::Address;
    use crate::pdu::dcs::Dcs;
    use crate::pdu::deliver::Deliver;
    use crate::pdu::timestamp::Scts;
    use crate::pdu::udh::UserDataHeader;
    use crate::pdu::user_data::UserData;

    fn segment(origin: &str, reference: u8, total: u8, sequence: u8, text: &str) -> Tpdu {
        let dcs = Dcs::ucs2();
        let user_data = UserData::from_text(text, &dcs).unwrap();
        let mut deliver = Deliver::new(Address::new(origin), dcs, Scts::default(), user_data);
        deliver.udh = Some(UserDataHeader::concat8(reference, total, sequence));
        Tpdu::Deliver(deliver)
    }

    fn single(origin: &str, text: &str) -> Tpdu {
        let dcs = Dcs::ucs2();
        let user_data = UserData::from_text(text, &dcs).unwrap();
        Tpdu::Deliver(Deliver::new(
            Address::new(origin),
            dcs,
            Scts::default(),
            user_data,
        ))
    }

    #[test]
    fn unconcatenated_tpdu_passes_through() {
        let collector = Collector::new();
        let out = collector.collect(single("+8613800138000", "hi")).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(collector.pending_groups(), 0);
    }

    #[test]
    fn group_emits_once_in_sequence_order() {
        let collector = Collector::new();
        let origin = "+8613800138000";

        // Segments arrive out of order.
        assert!(collector
            .collect(segment(origin, 0x42, 2, 2, "好"))
            .unwrap()
            .is_empty());
        let out = collector.collect(segment(origin, 0x42, 2, 1, "你")).unwrap();
        assert_eq!(out.len(), 2);

        let texts: Vec<String> = out.iter().map(|t| t.text().unwrap()).collect();
        assert_eq!(texts, ["你", "好"]);
        assert_eq!(collector.pending_groups(), 0);
    }

    #[test]
    fn duplicate_segment_is_rejected() {
        let collector = Collector::new();
        let origin = "+8613800138000";
        collector
            .collect(segment(origin, 7, 3, 1, "a"))
            .unwrap();
        let result = collector.collect(segment(origin, 7, 3, 1, "a"));
        assert!(matches!(
            result,
            Err(PduError::DuplicateSegment {
                reference: 7,
                sequence: 1
            })
        ));
        assert_eq!(collector.pending_groups(), 1);
    }

    #[test]
    fn groups_are_keyed_by_originator() {
        let collector = Collector::new();
        collector
            .collect(segment("+8613800138000", 1, 2, 1, "a"))
            .unwrap();
        // Same reference from another originator is a different group.
        assert!(collector
            .collect(segment("+8613800138001", 1, 2, 1, "b"))
            .unwrap()
            .is_empty());
        assert_eq!(collector.pending_groups(), 2);
    }

    #[test]
    fn out_of_range_sequence_is_rejected() {
        let collector = Collector::new();
        let result = collector.collect(segment("+86138", 1, 2, 3, "x"));
        assert!(matches!(result, Err(PduError::BadUdh(_))));
        let result = collector.collect(segment("+86138", 1, 1, 1, "x"));
        assert!(matches!(result, Err(PduError::BadUdh(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_group_expires_through_handler() {
        let expired: Arc<Mutex<Vec<ExpiredGroup>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        let collector = Collector::with_timeout(
            Duration::from_secs(30),
            Some(Arc::new(move |group| {
                sink.lock().unwrap().push(group);
            })),
        );

        collector
            .collect(segment("+8613800138000", 9, 3, 2, "b"))
            .unwrap();
        assert_eq!(collector.pending_groups(), 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(collector.pending_groups(), 0);

        let expired = expired.lock().unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].reference, 9);
        assert_eq!(expired[0].total, 3);
        assert_eq!(expired[0].segments.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_group_does_not_expire() {
        let expired: Arc<Mutex<Vec<ExpiredGroup>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        let collector = Collector::with_timeout(
            Duration::from_secs(30),
            Some(Arc::new(move |group| {
                sink.lock().unwrap().push(group);
            })),
        );

        let origin = "+8613800138000";
        collector.collect(segment(origin, 9, 2, 1, "a")).unwrap();
        let out = collector.collect(segment(origin, 9, 2, 2, "b")).unwrap();
        assert_eq!(out.len(), 2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(expired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_collector_suppresses_expiry() {
        let expired: Arc<Mutex<Vec<ExpiredGroup>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        let collector = Collector::with_timeout(
            Duration::from_secs(30),
            Some(Arc::new(move |group| {
                sink.lock().unwrap().push(group);
            })),
        );

        collector
            .collect(segment("+8613800138000", 9, 3, 1, "a"))
            .unwrap();
        collector.close();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(expired.lock().unwrap().is_empty());
    }
}
