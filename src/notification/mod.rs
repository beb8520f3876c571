/// 알림 디스패처
/// 입찰/정산 커밋 이후 도메인 이벤트를 큐에 적재하고, 백그라운드 태스크가
/// 수신자를 조회하여 메일을 발송한다. 발송 실패는 로그로만 남기며
/// 원장의 정합성이나 요청 응답에는 절대 영향을 주지 않는다.
// region:    --- Imports
use crate::query::queries;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Notification Model

/// 발송 대상 알림
#[derive(Debug, Clone)]
pub enum Notification {
    /// 상위 입찰 발생: 밀려난 입찰자에게 통지
    Outbid {
        user_id: String,
        item_title: String,
        new_bid_amount: f64,
    },
    /// 낙찰: 낙찰자에게 통지
    Winner {
        user_id: String,
        item_title: String,
        winning_bid: f64,
    },
}

impl Notification {
    fn recipient_uid(&self) -> &str {
        match self {
            Notification::Outbid { user_id, .. } => user_id,
            Notification::Winner { user_id, .. } => user_id,
        }
    }
}

/// 수신자 연락처 ({email, displayName} 계약)
#[derive(Debug, sqlx::FromRow)]
pub struct UserContact {
    pub email: String,
    pub display_name: Option<String>,
}

// endregion: --- Notification Model

// region:    --- Mailer

/// 메일 발송 트레이트
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, to: &str, subject: &str, text: &str) -> Result<(), String>;
}

/// HTTP 메일 릴레이로 발송하는 구현체
pub struct WebhookMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookMailer {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send_mail(&self, to: &str, subject: &str, text: &str) -> Result<(), String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "to": to,
                "subject": subject,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("메일 릴레이 응답 오류: {}", response.status()));
        }
        Ok(())
    }
}

/// 발송 없이 로그만 남기는 구현체 (릴레이 미설정 환경)
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_mail(&self, to: &str, subject: &str, _text: &str) -> Result<(), String> {
        info!(
            "{:<12} --> 메일 발송(로그만): to={}, subject={}",
            "Notify", to, subject
        );
        Ok(())
    }
}

/// 환경 변수에 따른 Mailer 선택
pub fn mailer_from_env() -> Arc<dyn Mailer> {
    match std::env::var("MAIL_WEBHOOK_URL") {
        Ok(url) => {
            info!("{:<12} --> 메일 릴레이 사용: {}", "Notify", url);
            Arc::new(WebhookMailer::new(url))
        }
        Err(_) => {
            info!("{:<12} --> 메일 릴레이 미설정: LogMailer 사용", "Notify");
            Arc::new(LogMailer)
        }
    }
}

// endregion: --- Mailer

// region:    --- Notifier

/// 알림 전송 핸들
/// 커밋 이후 fire-and-forget 으로 호출되며 절대 블로킹하지 않는다.
#[derive(Clone)]
pub struct Notifier {
    tx: UnboundedSender<Notification>,
}

impl Notifier {
    pub fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            warn!("{:<12} --> 알림 큐가 닫혀 있어 알림을 버립니다.", "Notify");
        }
    }
}

/// 알림 큐 생성
pub fn channel(
    pool: Arc<PgPool>,
    mailer: Arc<dyn Mailer>,
) -> (Notifier, NotificationDispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Notifier { tx },
        NotificationDispatcher { pool, mailer, rx },
    )
}

// endregion: --- Notifier

// region:    --- Notification Dispatcher

/// 알림 큐 소비자
pub struct NotificationDispatcher {
    pool: Arc<PgPool>,
    mailer: Arc<dyn Mailer>,
    rx: UnboundedReceiver<Notification>,
}

impl NotificationDispatcher {
    /// 알림 큐 소비 시작
    pub async fn start(mut self) {
        info!("{:<12} --> 알림 디스패처 시작", "Notify");
        while let Some(notification) = self.rx.recv().await {
            if let Err(e) = self.dispatch(&notification).await {
                error!("{:<12} --> 알림 발송 실패: {}", "Notify", e);
            }
        }
    }

    /// 알림 한 건 발송
    async fn dispatch(&self, notification: &Notification) -> Result<(), String> {
        let uid = notification.recipient_uid();

        let contact = sqlx::query_as::<_, UserContact>(queries::GET_USER_CONTACT)
            .bind(uid)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;

        let Some(contact) = contact else {
            warn!("{:<12} --> 수신자 정보 없음: uid={}", "Notify", uid);
            return Ok(());
        };

        send_notification(self.mailer.as_ref(), &contact, notification).await
    }
}

/// 수신자 연락처로 알림 메일을 구성하여 발송
async fn send_notification(
    mailer: &dyn Mailer,
    contact: &UserContact,
    notification: &Notification,
) -> Result<(), String> {
    let recipient_name = contact
        .display_name
        .clone()
        .unwrap_or_else(|| contact.email.clone());

    let (subject, text) = match notification {
        Notification::Outbid {
            item_title,
            new_bid_amount,
            ..
        } => (
            format!("You've been outbid on \"{}\"", item_title),
            format!(
                "Hello,\n\n\
                 You have been outbid on the auction item \"{}\".\n\
                 The new highest bid is ${}.\n\n\
                 If you want to continue bidding, place a new bid before the auction closes.\n\n\
                 Thank you,\nAuction Team",
                item_title, new_bid_amount
            ),
        ),
        Notification::Winner {
            item_title,
            winning_bid,
            ..
        } => (
            format!("Congratulations! You won the auction for {}", item_title),
            format!(
                "Dear {},\n\n\
                 Congratulations! You have won the auction for \"{}\" with a bid of ${}.\n\n\
                 Please visit the auction site to complete your purchase.\n\n\
                 Thank you for participating in our auction!\n\n\
                 Best regards,\nAuction Team",
                recipient_name, item_title, winning_bid
            ),
        ),
    };

    mailer.send_mail(&contact.email, &subject, &text).await?;
    info!(
        "{:<12} --> 알림 발송 완료: to={}, subject={}",
        "Notify", contact.email, subject
    );
    Ok(())
}

// endregion: --- Notification Dispatcher

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Mutex;
    use std::time::Duration;

    /// 발송 내역을 기록하는 Mailer
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_mail(&self, to: &str, subject: &str, text: &str) -> Result<(), String> {
            self.sent.lock().unwrap().push((
                to.to_string(),
                subject.to_string(),
                text.to_string(),
            ));
            Ok(())
        }
    }

    /// 항상 실패하는 Mailer
    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_mail(&self, _to: &str, _subject: &str, _text: &str) -> Result<(), String> {
            Err("메일 릴레이 연결 실패".to_string())
        }
    }

    fn contact(email: &str, display_name: Option<&str>) -> UserContact {
        UserContact {
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
        }
    }

    /// 연결할 수 없는 풀: 수신자 조회가 빠르게 실패한다
    fn unreachable_pool() -> Arc<PgPool> {
        Arc::new(
            PgPoolOptions::new()
                .acquire_timeout(Duration::from_millis(100))
                .connect_lazy("postgres://127.0.0.1:1/unreachable")
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_outbid_notification_targets_previous_bidder() {
        let mailer = RecordingMailer::new();
        let notification = Notification::Outbid {
            user_id: "bidder-a".to_string(),
            item_title: "골동품 시계".to_string(),
            new_bid_amount: 20.0,
        };

        send_notification(&mailer, &contact("a@example.com", Some("A")), &notification)
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (to, subject, text) = &sent[0];
        assert_eq!(to, "a@example.com");
        assert!(subject.contains("outbid"));
        assert!(subject.contains("골동품 시계"));
        assert!(text.contains("$20"));
    }

    #[tokio::test]
    async fn test_winner_notification_uses_display_name() {
        let mailer = RecordingMailer::new();
        let notification = Notification::Winner {
            user_id: "bidder-b".to_string(),
            item_title: "골동품 시계".to_string(),
            winning_bid: 35.0,
        };

        send_notification(
            &mailer,
            &contact("b@example.com", Some("홍길동")),
            &notification,
        )
        .await
        .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (to, subject, text) = &sent[0];
        assert_eq!(to, "b@example.com");
        assert!(subject.contains("won the auction"));
        assert!(text.contains("Dear 홍길동"));
        assert!(text.contains("$35"));
    }

    #[tokio::test]
    async fn test_winner_notification_falls_back_to_email_name() {
        let mailer = RecordingMailer::new();
        let notification = Notification::Winner {
            user_id: "bidder-b".to_string(),
            item_title: "골동품 시계".to_string(),
            winning_bid: 35.0,
        };

        send_notification(&mailer, &contact("b@example.com", None), &notification)
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].2.contains("Dear b@example.com"));
    }

    #[tokio::test]
    async fn test_failing_mailer_reports_error() {
        let notification = Notification::Outbid {
            user_id: "bidder-a".to_string(),
            item_title: "골동품 시계".to_string(),
            new_bid_amount: 20.0,
        };

        let result =
            send_notification(&FailingMailer, &contact("a@example.com", None), &notification).await;
        assert!(result.is_err());
    }

    /// 디스패처는 발송 실패를 로그로만 남기고 계속 동작한다
    #[tokio::test]
    async fn test_dispatcher_survives_delivery_failures() {
        let (notifier, dispatcher) = channel(unreachable_pool(), Arc::new(FailingMailer));
        let handle = tokio::spawn(dispatcher.start());

        // 두 건 모두 수신자 조회 단계에서 실패하지만 루프는 계속되어야 한다
        notifier.notify(Notification::Outbid {
            user_id: "bidder-a".to_string(),
            item_title: "골동품 시계".to_string(),
            new_bid_amount: 20.0,
        });
        notifier.notify(Notification::Winner {
            user_id: "bidder-b".to_string(),
            item_title: "골동품 시계".to_string(),
            winning_bid: 35.0,
        });

        // 송신 핸들을 닫으면 큐를 소진한 뒤 정상 종료한다
        drop(notifier);
        handle.await.unwrap();
    }

    /// 닫힌 큐에 대한 notify 는 패닉 없이 무시된다
    #[tokio::test]
    async fn test_notify_on_closed_queue_is_ignored() {
        let (notifier, dispatcher) = channel(unreachable_pool(), Arc::new(LogMailer));
        drop(dispatcher);

        notifier.notify(Notification::Outbid {
            user_id: "bidder-a".to_string(),
            item_title: "골동품 시계".to_string(),
            new_bid_amount: 20.0,
        });
    }
}

// endregion: --- Tests
