use chrono::Utc;
use rand::Rng;

/// 生成带前缀的时间派生ID，如 `user_1721900000000_0042`。
/// 毫秒时间戳加4位随机后缀，并发请求下碰撞概率可忽略。
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen_range(0..10000);
    format!("{}_{}_{:04}", prefix, millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id("user");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "user");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_ids_are_distinct() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| generate_id("payment")).collect();
        // 理论上可能碰撞，但概率极小
        assert!(ids.len() > 95);
    }
}
