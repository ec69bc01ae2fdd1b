use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色，由身份服务签发的令牌携带
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub enum UserRole {
    Student,  // 考生
    Reviewer, // 评阅人
    Admin,    // 管理员
}

impl UserRole {
    pub const STUDENT: &'static str = "student";
    pub const REVIEWER: &'static str = "reviewer";
    pub const ADMIN: &'static str = "admin";

    pub fn reviewer_roles() -> &'static [&'static UserRole] {
        &[&Self::Reviewer, &Self::Admin]
    }

    pub fn is_reviewer(&self) -> bool {
        matches!(self, UserRole::Reviewer | UserRole::Admin)
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: student, reviewer, admin"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "{}", UserRole::STUDENT),
            UserRole::Reviewer => write!(f, "{}", UserRole::REVIEWER),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::STUDENT => Ok(UserRole::Student),
            UserRole::REVIEWER => Ok(UserRole::Reviewer),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

/// 已认证的调用者，由 RequireJWT 放入请求扩展
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: UserRole,
}

impl AuthUser {
    /// 学生只能访问自己的会话，评阅人与管理员不受限
    pub fn can_access_session_of(&self, student_id: i64) -> bool {
        self.role.is_reviewer() || self.owns_session_of(student_id)
    }

    /// 保存作答与交卷只允许会话所属学生本人
    pub fn owns_session_of(&self, student_id: i64) -> bool {
        self.role == UserRole::Student && self.id == student_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("reviewer".parse::<UserRole>(), Ok(UserRole::Reviewer));
        assert!("teacher".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }

    #[test]
    fn test_session_access() {
        let student = AuthUser {
            id: 3,
            role: UserRole::Student,
        };
        let reviewer = AuthUser {
            id: 9,
            role: UserRole::Reviewer,
        };
        assert!(student.can_access_session_of(3));
        assert!(!student.can_access_session_of(4));
        assert!(reviewer.can_access_session_of(4));
    }

    #[test]
    fn test_session_ownership() {
        let student = AuthUser {
            id: 3,
            role: UserRole::Student,
        };
        let reviewer = AuthUser {
            id: 4,
            role: UserRole::Reviewer,
        };
        assert!(student.owns_session_of(3));
        assert!(!student.owns_session_of(4));
        // 评阅人可以查看，但不能代替学生作答
        assert!(reviewer.can_access_session_of(4));
        assert!(!reviewer.owns_session_of(4));
    }
}
