use crate::error::Result;
use serde::{Deserialize, Serialize};
//use serde::de::IgnoredAny;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: String,
    pub name: String,
    pub has_access: bool,
    pub is_homework: bool,
    pub completion_time: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub preview: String,
    pub lessons: Vec<Lesson>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Profession {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// 只有调用 `get_courses` 后才会填充
    pub courses: Option<Vec<Course>>,
}

#[derive(Deserialize, Debug)]
pub struct TopicResponse {
    pub lessons: Vec<Lesson>,
    //pub id: IgnoredAny,
    //pub name: IgnoredAny,
}

#[derive(Deserialize, Debug)]
pub struct CourseResponse {
    pub id: String,
    pub name: String,
    pub result_picture: String,
    pub topics: Vec<TopicResponse>,
}

#[derive(Deserialize, Debug)]
pub struct SubscriptionResponse {
    pub profession_id: String,
    pub profession_name: String,
    pub profession_slug: String,
}

/// `/api/users/me/`
#[derive(Deserialize, Debug)]
pub struct MeResponse {
    #[serde(default)]
    pub subscriptions: Vec<serde_json::Value>,
}

/// `/api/v2/profiles/{slug}/`
#[derive(Deserialize, Debug)]
pub struct ProfileResponse {
    #[serde(default)]
    pub courses: Vec<serde_json::Value>,
}

impl From<CourseResponse> for Course {
    fn from(raw: CourseResponse) -> Self {
        // topic 本身丢弃，按顺序展平 lesson
        let lessons = raw
            .topics
            .into_iter()
            .flat_map(|topic| topic.lessons)
            .collect();

        Course {
            id: raw.id,
            name: raw.name,
            preview: raw.result_picture,
            lessons,
        }
    }
}

impl From<SubscriptionResponse> for Profession {
    fn from(raw: SubscriptionResponse) -> Self {
        Profession {
            id: raw.profession_id,
            name: raw.profession_name,
            slug: raw.profession_slug,
            courses: None,
        }
    }
}

impl Course {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let raw: CourseResponse = serde_json::from_value(value)?;
        Ok(raw.into())
    }
}

impl Profession {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let raw: SubscriptionResponse = serde_json::from_value(value)?;
        Ok(raw.into())
    }
}

impl MeResponse {
    pub fn into_professions(self) -> Result<Vec<Profession>> {
        self.subscriptions
            .into_iter()
            .map(Profession::from_json)
            .collect()
    }
}

impl ProfileResponse {
    pub fn into_courses(self) -> Result<Vec<Course>> {
        self.courses.into_iter().map(Course::from_json).collect()
    }
}
