//! Presentation order for verdicts.

use crate::model::verdict::Verdict;

/// Sort by trash code, then by received time, both ascending.
///
/// `sort_by` is stable, so verdicts equal on both keys keep their scan order.
pub fn sort_verdicts(verdicts: &mut [Verdict]) {
    verdicts.sort_by(|a, b| a.code.cmp(&b.code).then(a.received.cmp(&b.received)));
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::model::envelope::MessageUid;
    use crate::model::verdict::{Category, TrashCode};

    fn verdict(uid: u64, code: u8, received: DateTime<Utc>) -> Verdict {
        Verdict {
            uid: MessageUid(uid),
            code: TrashCode::try_from(code).unwrap(),
            category: Category::NotWhitelisted,
            received,
            from: String::new(),
            subject: String::new(),
        }
    }

    fn codes(v: &[Verdict]) -> Vec<u8> {
        v.iter().map(|v| v.code.as_u8()).collect()
    }

    fn uids(v: &[Verdict]) -> Vec<u64> {
        v.iter().map(|v| v.uid.0).collect()
    }

    #[test]
    fn test_codes_ascending_ties_stable() {
        let t = Utc.with_ymd_and_hms(2024, 1, 4, 10, 0, 0).unwrap();
        let mut v = vec![verdict(1, 5, t), verdict(2, 1, t), verdict(3, 3, t), verdict(4, 1, t)];
        sort_verdicts(&mut v);
        assert_eq!(codes(&v), [1, 1, 3, 5]);
        assert_eq!(uids(&v), [2, 4, 3, 1]);
    }

    #[test]
    fn test_time_breaks_code_ties() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut v = vec![verdict(1, 4, late), verdict(2, 4, early), verdict(3, 2, late)];
        sort_verdicts(&mut v);
        assert_eq!(uids(&v), [3, 2, 1]);
    }

    #[test]
    fn test_empty() {
        let mut v: Vec<Verdict> = Vec::new();
        sort_verdicts(&mut v);
        assert!(v.is_empty());
    }
}
