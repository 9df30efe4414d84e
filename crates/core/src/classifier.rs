use crate::model::{CourseProgress, EnrollmentBucket};

/// Dashboard bucket for a single progress record.
///
/// A course with no authored videos is always `NotStarted`, whatever the
/// record's other fields say. Non-finite or negative percentages read as 0.
#[must_use]
pub fn classify(progress: &CourseProgress) -> EnrollmentBucket {
    if progress.total_videos == 0 {
        return EnrollmentBucket::NotStarted;
    }
    if progress.is_completed {
        return EnrollmentBucket::Completed;
    }

    let percentage = progress.progress_percentage;
    if percentage.is_finite() && percentage > 0.0 {
        EnrollmentBucket::InProgress
    } else {
        EnrollmentBucket::NotStarted
    }
}

/// A learner's enrolled courses split into dashboard tabs.
///
/// Each bucket keeps the order in which records were supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentBuckets {
    pub not_started: Vec<CourseProgress>,
    pub in_progress: Vec<CourseProgress>,
    pub completed: Vec<CourseProgress>,
}

impl EnrollmentBuckets {
    #[must_use]
    pub fn get(&self, bucket: EnrollmentBucket) -> &[CourseProgress] {
        match bucket {
            EnrollmentBucket::NotStarted => &self.not_started,
            EnrollmentBucket::InProgress => &self.in_progress,
            EnrollmentBucket::Completed => &self.completed,
        }
    }

    /// Badge count for a dashboard tab.
    #[must_use]
    pub fn count(&self, bucket: EnrollmentBucket) -> usize {
        self.get(bucket).len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.not_started.len() + self.in_progress.len() + self.completed.len()
    }
}

pub struct EnrollmentClassifier;

impl EnrollmentClassifier {
    #[must_use]
    pub fn partition<'a, I>(records: I) -> EnrollmentBuckets
    where
        I: IntoIterator<Item = &'a CourseProgress>,
    {
        let mut buckets = EnrollmentBuckets::default();
        for record in records {
            let target = match classify(record) {
                EnrollmentBucket::NotStarted => &mut buckets.not_started,
                EnrollmentBucket::InProgress => &mut buckets.in_progress,
                EnrollmentBucket::Completed => &mut buckets.completed,
            };
            target.push(record.clone());
        }
        buckets
    }
}
