use super::PageObject;
use crate::constants::LOGIN_URL;
use crate::locator::Locator;
use crate::page::Page;
use crate::result::ProbeResult;
use crate::wait::ElementState;

/// Sign-in and registration forms
#[derive(Debug, Clone)]
pub struct AuthPage {
    page: Page,
    /// Login e-mail
    pub email_input: Locator,
    /// Login password
    pub password_input: Locator,
    /// Login submit
    pub sign_in_button: Locator,
    /// "Forgot Your Password?" link
    pub forgot_password_link: Locator,
    /// Rejected-credentials banner
    pub login_error_message: Locator,
    /// Registration first name
    pub first_name_input: Locator,
    /// Registration last name
    pub last_name_input: Locator,
    /// Registration e-mail
    pub reg_email_input: Locator,
    /// Registration password
    pub reg_password_input: Locator,
    /// Registration password confirmation
    pub confirm_password_input: Locator,
    /// Registration submit
    pub create_account_button: Locator,
    /// Banner shown after registering
    pub registration_success_message: Locator,
}

impl AuthPage {
    /// Bind to `page`
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            email_input: Locator::new("#email"),
            password_input: Locator::new("[title=\"Password\"]"),
            sign_in_button: Locator::role("button", "Sign In"),
            forgot_password_link: Locator::new("a").with_text("Forgot Your Password?"),
            login_error_message: Locator::text("The account sign-in was"),
            first_name_input: Locator::new("#firstname"),
            last_name_input: Locator::new("#lastname"),
            reg_email_input: Locator::new("#email_address"),
            reg_password_input: Locator::new("#password"),
            confirm_password_input: Locator::new("#password-confirmation"),
            create_account_button: Locator::new("button[title=\"Create an Account\"]"),
            registration_success_message: Locator::new(".message-success"),
        }
    }

    /// Submit the login form. Waits for the DOM only, since a rejected login
    /// re-renders the same page.
    pub async fn login(&self, email: &str, password: &str) -> ProbeResult<()> {
        self.page.fill(&self.email_input, email).await?;
        self.page.fill(&self.password_input, password).await?;
        self.page.click(&self.sign_in_button).await?;
        self.page.wait_for_dom_ready().await
    }

    /// Submit the registration form
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> ProbeResult<()> {
        self.page.fill(&self.first_name_input, first_name).await?;
        self.page.fill(&self.last_name_input, last_name).await?;
        self.page.fill(&self.reg_email_input, email).await?;
        self.page.fill(&self.reg_password_input, password).await?;
        self.page.fill(&self.confirm_password_input, password).await?;
        self.page.click(&self.create_account_button).await?;
        self.page.wait_for_navigation_idle().await
    }

    pub async fn login_error_message(&self) -> ProbeResult<String> {
        self.page
            .wait_for(
                &self.login_error_message,
                ElementState::Visible,
                Some(self.page.expect_timeout()),
            )
            .await?;
        self.page.get_text(&self.login_error_message).await
    }

    pub async fn registration_success_message(&self) -> ProbeResult<String> {
        self.page
            .wait_for(
                &self.registration_success_message,
                ElementState::Visible,
                Some(self.page.expect_timeout()),
            )
            .await?;
        self.page.get_text(&self.registration_success_message).await
    }
}

impl PageObject for AuthPage {
    fn path(&self) -> &str {
        LOGIN_URL
    }

    fn page(&self) -> &Page {
        &self.page
    }
}
